use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::search::{DictStore, QueryCompiler, ResponseCache, SearchService};

/// Shared handler state / 共享的处理器状态
///
/// Nothing here is mutated per request; the cache handles its own locking.
pub struct AppState {
    pub search: SearchService,
    pub cache: Arc<dyn ResponseCache>,
    /// Response cache TTL / 响应缓存过期时间
    pub cache_ttl: Duration,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DictStore>,
        cache: Arc<dyn ResponseCache>,
        compiler: QueryCompiler,
        store_timeout: Duration,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            search: SearchService::new(store, compiler, store_timeout),
            cache,
            cache_ttl,
        }
    }

    /// Build state from the search section of the config / 根据配置构建状态
    pub fn from_config(config: &AppConfig, store: Arc<dyn DictStore>, cache: Arc<dyn ResponseCache>) -> Self {
        Self::new(
            store,
            cache,
            QueryCompiler::new(config.search.compile_options()),
            config.search.store_timeout(),
            config.search.cache_ttl(),
        )
    }
}
