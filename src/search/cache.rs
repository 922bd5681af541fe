//! Response cache - serialized search responses keyed by request URL / 响应缓存

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

use super::schema::SearchMode;

/// Key-value cache with per-entry TTL / 带过期时间的键值缓存
#[async_trait]
pub trait ResponseCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn put(&self, key: &str, body: String, ttl: Duration);
}

/// Normalized request URL used as the cache key / 规范化请求URL作为缓存键
pub fn cache_key(query: &str, page: u32, mode: SearchMode) -> String {
    format!(
        "/search?q={}&page={}&mode={}",
        urlencoding::encode(query.trim()),
        page,
        mode.as_str()
    )
}

struct CachedBody {
    body: String,
    expires_at: Instant,
}

/// In-process cache / 进程内缓存
///
/// Expired entries are purged on insert; when full, the entry closest to
/// expiry is evicted.
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CachedBody>>,
    capacity: usize,
}

impl MemoryCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ResponseCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read();
        entries
            .get(key)
            .filter(|e| e.expires_at > Instant::now())
            .map(|e| e.body.clone())
    }

    async fn put(&self, key: &str, body: String, ttl: Duration) {
        let now = Instant::now();
        let mut entries = self.entries.write();
        entries.retain(|_, e| e.expires_at > now);

        if entries.len() >= self.capacity && !entries.contains_key(key) {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.expires_at)
                .map(|(k, _)| k.clone());
            if let Some(k) = oldest {
                entries.remove(&k);
            }
        }

        entries.insert(key.to_string(), CachedBody { body, expires_at: now + ttl });
    }
}
