//! Request memoization and rate limiting / 请求去重与限速

use std::fmt;
use std::time::{Duration, Instant};

use crate::search::SearchMode;

/// Identity of a page request / 一次页面请求的标识
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchKey {
    pub query: String,
    pub mode: SearchMode,
    pub page: u32,
    pub mod_filter: String,
}

impl SearchKey {
    pub fn new(query: &str, mode: SearchMode, page: u32, mod_filter: &str) -> Self {
        Self {
            query: query.trim().to_string(),
            mode,
            page,
            mod_filter: mod_filter.trim().to_string(),
        }
    }

    /// Same query text and mode, ignoring page and filter / 同一搜索词与模式
    pub fn same_search(&self, other: &SearchKey) -> bool {
        self.query == other.query && self.mode == other.mode
    }
}

impl fmt::Display for SearchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}_{}", self.query, self.mode, self.page, self.mod_filter)
    }
}

/// What to do with a request / 请求决策
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Fetch,
    /// Key unchanged, current results stand / 与上次相同，复用结果
    Reuse,
    /// Inside the rate-limit window / 处于限速窗口内
    Throttled,
}

/// Decide whether a request goes out / 决定是否发起请求
///
/// A forced request (a new search submitted by the user) bypasses both the
/// memo and the rate limit; page changes are subject to both.
pub fn decide(
    key: &SearchKey,
    last_key: Option<&SearchKey>,
    last_request_at: Option<Instant>,
    now: Instant,
    min_interval: Duration,
    force: bool,
) -> Decision {
    if !force && last_key == Some(key) {
        return Decision::Reuse;
    }

    let throttled = last_request_at
        .map(|at| now.saturating_duration_since(at) < min_interval)
        .unwrap_or(false);
    if throttled && !force {
        return Decision::Throttled;
    }

    Decision::Fetch
}
