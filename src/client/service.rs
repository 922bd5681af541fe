//! HTTP client and search session / HTTP 客户端与搜索会话

use futures::future::try_join_all;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};

use super::memo::{self, Decision, SearchKey};
use super::state::{merge_unique, reduce, Action, SessionState, MSG_ENTER_QUERY};
use crate::api::search::SearchResponse;
use crate::config::ClientConfig;
use crate::search::pagination;
use crate::search::{SearchMode, SearchRequest, SearchResult, ValidationError};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    details: Option<String>,
}

/// Typed client for `GET /search` / 搜索接口客户端
#[derive(Clone)]
pub struct SearchClient {
    http: Client,
    base_url: String,
}

impl SearchClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::new(&config.base_url, config.timeout())
    }

    pub fn search_url(&self, query: &str, mode: SearchMode, page: u32) -> String {
        format!(
            "{}/search?q={}&page={}&mode={}",
            self.base_url,
            urlencoding::encode(query),
            page,
            mode.as_str()
        )
    }

    /// Fetch one page / 获取单页
    pub async fn fetch_page(&self, req: &SearchRequest) -> Result<SearchResponse, ClientError> {
        let url = self.search_url(&req.query, req.mode, req.page);
        tracing::debug!("GET {}", url);

        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ErrorBody>(&text) {
                Ok(body) => match body.details {
                    Some(details) => format!("{} ({})", body.error, details),
                    None => body.error,
                },
                Err(_) => text,
            };
            return Err(ClientError::Status { status: status.as_u16(), message });
        }

        Ok(resp.json::<SearchResponse>().await?)
    }

    /// Fetch every page concurrently and merge, de-duplicated / 并发获取全部页面并去重
    ///
    /// `held` is a page already in hand; it is not requested again.
    pub async fn fetch_all_pages(
        &self,
        query: &str,
        mode: SearchMode,
        total: u64,
        held: Option<(u32, &[SearchResult])>,
    ) -> Result<Vec<SearchResult>, ClientError> {
        let pages = pagination::total_pages(total) as u32;
        let held_page = held.filter(|(_, rows)| !rows.is_empty()).map(|(p, _)| p);

        let requests = (1..=pages)
            .filter(|p| Some(*p) != held_page)
            .map(|page| SearchRequest::new(Some(query), mode, page))
            .collect::<Result<Vec<_>, _>>()?;

        let fetched = try_join_all(requests.iter().map(|req| self.fetch_page(req))).await?;

        let mut by_page: Vec<(u32, Vec<SearchResult>)> = requests
            .iter()
            .map(|r| r.page)
            .zip(fetched.into_iter().map(|resp| resp.results))
            .collect();
        if let (Some(page), Some((_, rows))) = (held_page, held) {
            by_page.push((page, rows.to_vec()));
        }
        by_page.sort_by_key(|(page, _)| *page);

        let mut all = Vec::new();
        for (_, rows) in by_page {
            merge_unique(&mut all, rows);
        }
        tracing::debug!("fetched {} pages for {:?}: {} results", pages, query, all.len());
        Ok(all)
    }
}

/// Result of a session search call / 一次会话搜索的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Fetched,
    Reused,
    Throttled,
    /// Served from the local cache under a mod filter / 本地筛选
    Filtered,
}

/// A user's search session: state plus the client driving it / 搜索会话
pub struct SearchSession {
    client: SearchClient,
    state: SessionState,
    min_interval: Duration,
}

impl SearchSession {
    pub fn new(client: SearchClient, min_interval: Duration) -> Self {
        Self {
            client,
            state: SessionState::default(),
            min_interval,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        Ok(Self::new(SearchClient::from_config(config)?, config.min_interval()))
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn dispatch(&mut self, action: Action) {
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, action);
    }

    /// Run the current query / 执行当前搜索
    ///
    /// `new_search` marks a search submitted by the user: it resets to page 1
    /// and bypasses the memo and the rate limit.
    pub async fn search(&mut self, new_search: bool) -> Result<Outcome, ClientError> {
        let query = self.state.query.trim().to_string();
        let mode = self.state.mode;

        if new_search {
            let changed = self
                .state
                .last_key
                .as_ref()
                .map(|k| !k.same_search(&SearchKey::new(&query, mode, 1, "")))
                .unwrap_or(true);
            if changed {
                self.dispatch(Action::ResetSearch);
            }
            self.dispatch(Action::GoToPage(1));
        }
        let page = self.state.page;

        let req = match SearchRequest::new(Some(&query), mode, page) {
            Ok(req) => req,
            Err(e) => {
                let message = match e {
                    ValidationError::Missing => MSG_ENTER_QUERY.to_string(),
                    _ => e.to_string(),
                };
                self.dispatch(Action::Rejected(message));
                return Err(e.into());
            }
        };

        if self.state.filter_active() && self.state.has_all_results() {
            return Ok(Outcome::Filtered);
        }

        let key = SearchKey::new(&req.query, mode, page, &self.state.mod_filter);
        let now = Instant::now();
        match memo::decide(
            &key,
            self.state.last_key.as_ref(),
            self.state.last_request_at,
            now,
            self.min_interval,
            new_search,
        ) {
            Decision::Reuse => {
                tracing::debug!("skipping repeated request {}", key);
                return Ok(Outcome::Reused);
            }
            Decision::Throttled => return Ok(Outcome::Throttled),
            Decision::Fetch => {}
        }

        self.dispatch(Action::RequestStarted { at: now });
        match self.client.fetch_page(&req).await {
            Ok(resp) => {
                self.dispatch(Action::PageLoaded {
                    key,
                    results: resp.results,
                    total: resp.total,
                    elapsed: now.elapsed(),
                });
            }
            Err(e) => {
                tracing::warn!("search request failed: {}", e);
                self.dispatch(Action::RequestFailed(format!("search failed: {}", e)));
                return Err(e);
            }
        }

        self.apply_mod_filter().await?;
        Ok(Outcome::Fetched)
    }

    /// Apply the current mod filter, fetching every page first when needed / 应用模组筛选
    pub async fn apply_mod_filter(&mut self) -> Result<(), ClientError> {
        if self.state.query.trim().is_empty()
            || !self.state.filter_active()
            || self.state.has_all_results()
            || self.state.loading
        {
            return Ok(());
        }

        self.dispatch(Action::RequestStarted { at: Instant::now() });
        let held = (self.state.page, self.state.current_results.clone());
        let fetched = self
            .client
            .fetch_all_pages(&self.state.query, self.state.mode, self.state.total, Some((held.0, &held.1[..])))
            .await;

        match fetched {
            Ok(all) => {
                self.dispatch(Action::AllResultsLoaded(all));
                Ok(())
            }
            Err(e) => {
                tracing::warn!("fetching all pages failed: {}", e);
                self.dispatch(Action::RequestFailed(format!("search failed: {}", e)));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::router;
    use crate::search::store::tests::{entry, memory_store};
    use crate::search::{MemoryCache, QueryCompiler};
    use crate::state::AppState;
    use std::sync::Arc;

    /// Serve the real router over an in-memory dictionary / 启动测试服务
    async fn spawn_server(entries: &[crate::search::DictionaryEntry]) -> String {
        let store = memory_store(entries).await;
        let state = AppState::new(
            Arc::new(store),
            Arc::new(MemoryCache::new(64)),
            QueryCompiler::default(),
            Duration::from_secs(5),
            Duration::from_secs(60),
        );
        let app = router(Arc::new(state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn gears(n: usize) -> Vec<crate::search::DictionaryEntry> {
        (0..n)
            .map(|i| {
                let modid = if i % 3 == 0 { "ae2" } else { "create" };
                entry(&format!("gear {}", i), &format!("齿轮{}", i), modid, "1.0")
            })
            .collect()
    }

    fn session(base: &str) -> SearchSession {
        SearchSession::new(SearchClient::new(base, Duration::from_secs(5)).unwrap(), Duration::from_millis(1000))
    }

    #[test]
    fn test_search_url_encoding() {
        let client = SearchClient::new("http://localhost:8787/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.search_url("red torch", SearchMode::Zh2En, 2),
            "http://localhost:8787/search?q=red%20torch&page=2&mode=zh2en"
        );
    }

    #[tokio::test]
    async fn test_fetch_page() {
        let base = spawn_server(&[
            entry("Torch", "火把", "minecraft", "1.20"),
            entry("Torch", "火把", "create", "0.5"),
        ])
        .await;
        let client = SearchClient::new(&base, Duration::from_secs(5)).unwrap();

        let req = SearchRequest::new(Some("torch"), SearchMode::En2Zh, 1).unwrap();
        let resp = client.fetch_page(&req).await.unwrap();
        assert_eq!(resp.total, 1);
        assert_eq!(resp.results[0].frequency, 2);
        assert_eq!(resp.mode, SearchMode::En2Zh);
    }

    #[tokio::test]
    async fn test_server_error_is_reported() {
        let base = spawn_server(&[]).await;
        let client = SearchClient::new(&base, Duration::from_secs(5)).unwrap();

        let req = SearchRequest::new(Some("-only"), SearchMode::En2Zh, 1).unwrap();
        match client.fetch_page(&req).await {
            Err(ClientError::Status { status, message }) => {
                assert_eq!(status, 400);
                assert!(message.starts_with("invalid query"));
            }
            other => panic!("unexpected: {:?}", other.map(|r| r.total)),
        }
    }

    #[tokio::test]
    async fn test_fetch_all_pages_dedupes() {
        let base = spawn_server(&gears(120)).await;
        let client = SearchClient::new(&base, Duration::from_secs(5)).unwrap();

        let req = SearchRequest::new(Some("gear"), SearchMode::En2Zh, 1).unwrap();
        let first = client.fetch_page(&req).await.unwrap();
        assert_eq!(first.total, 120);
        assert_eq!(first.results.len(), 50);

        let all = client
            .fetch_all_pages("gear", SearchMode::En2Zh, first.total, Some((1, &first.results)))
            .await
            .unwrap();
        assert_eq!(all.len(), 120);
        assert_eq!(all[..50], first.results[..]);
    }

    #[tokio::test]
    async fn test_session_memo_and_rate_limit() {
        let base = spawn_server(&gears(120)).await;
        let mut session = session(&base);

        assert!(matches!(session.search(true).await, Err(ClientError::Validation(_))));
        assert_eq!(session.state().message.as_deref(), Some(MSG_ENTER_QUERY));

        session.dispatch(Action::SetQuery("gear".into()));
        assert_eq!(session.search(true).await.unwrap(), Outcome::Fetched);
        assert_eq!(session.state().total, 120);
        assert_eq!(session.state().current_results.len(), 50);
        assert_eq!(session.state().available_mods, vec!["create", "ae2"]);

        // 同一键不重复请求
        assert_eq!(session.search(false).await.unwrap(), Outcome::Reused);

        // 翻页处于限速窗口内
        session.dispatch(Action::GoToPage(2));
        assert_eq!(session.search(false).await.unwrap(), Outcome::Throttled);
    }

    #[tokio::test]
    async fn test_session_mod_filter_fetches_all_pages() {
        let base = spawn_server(&gears(120)).await;
        let mut session = session(&base);

        session.dispatch(Action::SetQuery("gear".into()));
        session.search(true).await.unwrap();
        assert!(!session.state().has_all_results());

        session.dispatch(Action::SetModFilter("AE2".into()));
        session.apply_mod_filter().await.unwrap();

        let state = session.state();
        assert!(state.has_all_results());
        let (rows, total) = state.visible();
        assert_eq!(total, 40);
        assert_eq!(rows.len(), 40);
        assert!(rows.iter().all(|r| r.all_mods[0].starts_with("ae2 ")));

        // 全部结果已缓存，筛选在本地完成
        assert_eq!(session.search(false).await.unwrap(), Outcome::Filtered);
    }

    #[tokio::test]
    async fn test_too_long_query_is_rejected_locally() {
        let mut session = session("http://127.0.0.1:9");
        session.dispatch(Action::SetQuery("x".repeat(51)));
        assert!(matches!(
            session.search(true).await,
            Err(ClientError::Validation(ValidationError::TooLong))
        ));
        assert_eq!(session.state().message.as_deref(), Some("query term too long"));
        assert!(!session.state().loading);
    }
}
