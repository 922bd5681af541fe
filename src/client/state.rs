//! Client session state / 客户端会话状态
//!
//! All updates go through [`reduce`]; the state holds no handles and can be
//! cloned freely.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use super::filter;
use super::memo::SearchKey;
use crate::search::pagination::{self, PageLink};
use crate::search::{SearchMode, SearchResult};

pub const MSG_ENTER_QUERY: &str = "enter a search term";
pub const MSG_SEARCHING: &str = "searching...";
pub const MSG_NO_RESULTS: &str = "no results found";
pub const MSG_NO_MOD_RESULTS: &str = "no results for the selected mod";

#[derive(Debug, Clone)]
pub struct SessionState {
    pub query: String,
    pub mode: SearchMode,
    pub mod_filter: String,
    /// Current page, 1-indexed / 当前页码
    pub page: u32,
    /// Key of the last completed request / 上次完成请求的键
    pub last_key: Option<SearchKey>,
    pub last_request_at: Option<Instant>,
    /// Results of the page last fetched / 当前页结果
    pub current_results: Vec<SearchResult>,
    /// Every result seen for this search, de-duplicated / 已获取的全部结果
    pub all_results: Vec<SearchResult>,
    /// Server-side total / 服务端总数
    pub total: u64,
    pub available_mods: Vec<String>,
    pub loading: bool,
    pub message: Option<String>,
    /// Round trip of the last request / 上次请求耗时
    pub elapsed: Option<Duration>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            query: String::new(),
            mode: SearchMode::default(),
            mod_filter: String::new(),
            page: 1,
            last_key: None,
            last_request_at: None,
            current_results: Vec::new(),
            all_results: Vec::new(),
            total: 0,
            available_mods: Vec::new(),
            loading: false,
            message: Some(MSG_ENTER_QUERY.to_string()),
            elapsed: None,
        }
    }
}

impl SessionState {
    /// Every page of the current search is cached locally / 全部结果已缓存
    pub fn has_all_results(&self) -> bool {
        !self.all_results.is_empty() && self.all_results.len() as u64 >= self.total
    }

    pub fn filter_active(&self) -> bool {
        !self.mod_filter.trim().is_empty()
    }

    /// Rows to show and the total they page over / 当前可见结果及其总数
    ///
    /// With a mod filter and a complete local cache the page is cut from
    /// the filtered cache; otherwise it is the page last fetched.
    pub fn visible(&self) -> (Vec<SearchResult>, u64) {
        if self.filter_active() && self.has_all_results() {
            let filtered = filter::apply_mod_filter(&self.all_results, &self.mod_filter);
            let total = filtered.len() as u64;
            (pagination::window(filtered, self.page), total)
        } else {
            (self.current_results.clone(), self.total)
        }
    }

    pub fn total_pages(&self) -> u64 {
        pagination::total_pages(self.visible().1)
    }

    /// Page selector for the visible results / 分页器
    pub fn page_links(&self) -> Vec<PageLink> {
        let total = self.visible().1;
        let pages = pagination::total_pages(total).min(u32::MAX as u64) as u32;
        pagination::page_links(pagination::clamp_page(self.page, total), pages)
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    SetQuery(String),
    SetMode(SearchMode),
    SetModFilter(String),
    GoToPage(u32),
    /// New query or mode: drop the filter and cached pages / 新搜索，清空筛选与缓存
    ResetSearch,
    /// Input refused before any request / 输入校验失败
    Rejected(String),
    RequestStarted { at: Instant },
    PageLoaded {
        key: SearchKey,
        results: Vec<SearchResult>,
        total: u64,
        elapsed: Duration,
    },
    AllResultsLoaded(Vec<SearchResult>),
    RequestFailed(String),
}

/// Append results whose `(originName, transName)` pair is not yet present / 去重合并
pub fn merge_unique(into: &mut Vec<SearchResult>, more: impl IntoIterator<Item = SearchResult>) {
    let mut seen: HashSet<(String, String)> = into
        .iter()
        .map(|r| (r.origin_name.clone(), r.trans_name.clone()))
        .collect();
    for r in more {
        if seen.insert((r.origin_name.clone(), r.trans_name.clone())) {
            into.push(r);
        }
    }
}

fn filter_message(state: &SessionState) -> Option<String> {
    if state.filter_active() && state.has_all_results() && state.visible().0.is_empty() {
        Some(MSG_NO_MOD_RESULTS.to_string())
    } else {
        None
    }
}

pub fn reduce(mut state: SessionState, action: Action) -> SessionState {
    match action {
        Action::SetQuery(query) => state.query = query,
        Action::SetMode(mode) => state.mode = mode,
        Action::SetModFilter(mod_filter) => {
            state.mod_filter = mod_filter.trim().to_string();
            if state.total > 0 {
                state.message = filter_message(&state);
            }
        }
        Action::GoToPage(page) => state.page = page.max(1),
        Action::ResetSearch => {
            state.mod_filter.clear();
            state.all_results.clear();
        }
        Action::Rejected(message) => {
            state.message = Some(message);
            state.total = 0;
            state.current_results.clear();
        }
        Action::RequestStarted { at } => {
            state.last_request_at = Some(at);
            state.loading = true;
            state.message = Some(MSG_SEARCHING.to_string());
            state.elapsed = None;
        }
        Action::PageLoaded { key, results, total, elapsed } => {
            state.loading = false;
            state.elapsed = Some(elapsed);

            if results.is_empty() {
                state.message = Some(MSG_NO_RESULTS.to_string());
                state.total = 0;
                state.current_results.clear();
                state.available_mods.clear();
            } else {
                if key.page == 1 {
                    state.all_results = results.clone();
                } else {
                    merge_unique(&mut state.all_results, results.iter().cloned());
                }
                state.current_results = results;
                state.total = total;

                if key.page == 1 && key.mod_filter.is_empty() {
                    state.available_mods = filter::available_mods(&state.current_results);
                } else if !key.mod_filter.is_empty() {
                    state.available_mods = filter::available_mods(&state.all_results);
                }
                state.message = filter_message(&state);
            }
            state.last_key = Some(key);
        }
        Action::AllResultsLoaded(results) => {
            state.loading = false;
            state.page = 1;
            state.all_results = results;
            state.available_mods = filter::available_mods(&state.all_results);
            state.message = if state.all_results.is_empty() {
                Some(MSG_NO_RESULTS.to_string())
            } else {
                filter_message(&state)
            };
        }
        Action::RequestFailed(message) => {
            state.loading = false;
            state.message = Some(message);
            state.total = 0;
            state.current_results.clear();
            state.elapsed = None;
        }
    }
    state
}
