//! SQL dump cleaner / SQL 导出文件清理
//!
//! Prepares a dictionary dump for import into SQLite: drops the header line,
//! every line calling `unistr(` (any case), and the trailing 6 lines.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Trailing lines dropped from every dump / 末尾丢弃的行数
pub const TRAILING_LINES: usize = 6;

const UNISTR: &[u8] = b"unistr(";

/// Line counts of a cleaning run / 清理统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanStats {
    pub total: usize,
    pub kept: usize,
}

impl CleanStats {
    pub fn dropped(&self) -> usize {
        self.total - self.kept
    }
}

fn contains_unistr(line: &str) -> bool {
    line.as_bytes()
        .windows(UNISTR.len())
        .any(|w| w.eq_ignore_ascii_case(UNISTR))
}

/// Stream `reader` into `writer`, dropping what SQLite cannot import / 流式清理
pub fn clean_sql_dump<R: BufRead, W: Write>(mut reader: R, mut writer: W) -> io::Result<CleanStats> {
    let mut stats = CleanStats::default();
    let mut tail: VecDeque<String> = VecDeque::with_capacity(TRAILING_LINES + 1);
    let mut line = String::new();

    while reader.read_line(&mut line)? != 0 {
        stats.total += 1;
        let keep = stats.total > 1 && !contains_unistr(&line);
        if keep {
            tail.push_back(std::mem::take(&mut line));
            if tail.len() > TRAILING_LINES {
                if let Some(front) = tail.pop_front() {
                    writer.write_all(front.as_bytes())?;
                    stats.kept += 1;
                }
            }
        }
        line.clear();
    }

    writer.flush()?;
    tracing::info!(
        "dump cleaned: {} lines read, {} kept, {} dropped",
        stats.total,
        stats.kept,
        stats.dropped()
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(input: &str) -> (String, CleanStats) {
        let mut out = Vec::new();
        let stats = clean_sql_dump(input.as_bytes(), &mut out).unwrap();
        (String::from_utf8(out).unwrap(), stats)
    }

    #[test]
    fn test_drops_header_unistr_and_tail() {
        let mut input = String::from("PRAGMA foreign_keys=OFF;\n");
        input.push_str("INSERT INTO dict VALUES('Torch','火把');\n");
        input.push_str("INSERT INTO dict VALUES(UNISTR('\\u00e9'),'x');\n");
        input.push_str("INSERT INTO dict VALUES('Gear','齿轮');\n");
        for i in 0..6 {
            input.push_str(&format!("-- trailer {}\n", i));
        }

        let (out, stats) = clean(&input);
        assert_eq!(
            out,
            "INSERT INTO dict VALUES('Torch','火把');\nINSERT INTO dict VALUES('Gear','齿轮');\n"
        );
        assert_eq!(stats, CleanStats { total: 10, kept: 2 });
        assert_eq!(stats.dropped(), 8);
    }

    #[test]
    fn test_short_input_yields_nothing() {
        let (out, stats) = clean("header\na\nb\nc\n");
        assert!(out.is_empty());
        assert_eq!(stats.total, 4);
        assert_eq!(stats.kept, 0);

        let (out, _) = clean("");
        assert!(out.is_empty());
    }

    #[test]
    fn test_unistr_match_is_case_insensitive() {
        assert!(contains_unistr("values(unistr('a'))"));
        assert!(contains_unistr("values(UniStr('a'))"));
        assert!(!contains_unistr("unistr 'a'"));
    }
}
