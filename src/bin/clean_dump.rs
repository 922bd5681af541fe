use anyhow::Context;
use clap::Parser;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mcdict_backend::dump;

#[derive(Parser)]
#[command(name = "mcdict-clean-dump")]
#[command(about = "Clean a dictionary SQL dump for SQLite import")]
struct Cli {
    /// Source dump
    #[arg(default_value = "input.sql")]
    input: PathBuf,

    /// Cleaned output
    #[arg(short, long, default_value = "Dict-Sqlite.sql")]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mcdict_backend=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let input = File::open(&cli.input)
        .with_context(|| format!("failed to open {}", cli.input.display()))?;
    let output = File::create(&cli.output)
        .with_context(|| format!("failed to create {}", cli.output.display()))?;

    let stats = dump::clean_sql_dump(BufReader::new(input), BufWriter::new(output))?;
    println!(
        "{} -> {}: {} lines, {} kept, {} dropped",
        cli.input.display(),
        cli.output.display(),
        stats.total,
        stats.kept,
        stats.dropped()
    );
    Ok(())
}
