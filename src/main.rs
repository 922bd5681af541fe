use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mcdict_backend::search::{MemoryCache, SqliteStore};
use mcdict_backend::state::AppState;
use mcdict_backend::{api, config, db};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mcdict_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("mcdict-backend built at {}", env!("BUILD_TIME"));

    // Load configuration / 加载配置
    let app_config = config::load_config().map_err(anyhow::Error::msg)?;
    tracing::info!("Server will listen on {}:{}", app_config.server.host, app_config.server.port);

    // Create data directory if not exists / 创建数据目录
    let data_dir = app_config.get_data_dir();
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        tracing::info!("Created data directory: {:?}", data_dir);
    }

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| app_config.get_database_url());

    let store = SqliteStore::connect(&database_url, app_config.database.max_connections)
        .await?
        .with_match_limit(app_config.search.match_limit());
    db::run_migrations(store.pool()).await?;
    tracing::info!("Dictionary holds {} entries", store.entry_count().await?);

    let cache = Arc::new(MemoryCache::new(app_config.search.cache_capacity));
    let state = AppState::from_config(&app_config, Arc::new(store), cache);
    let app = api::router(Arc::new(state));

    let bind_addr = app_config.get_bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await?;

    tracing::info!("Server running at http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
