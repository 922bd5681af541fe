//! Search service - validation, compile, store reads, ranking, paging / 搜索服务

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::compiler::{CompileError, CompiledQuery, QueryCompiler};
use super::pagination;
use super::ranking;
use super::schema::{SearchMode, SearchResult};
use super::store::{DictStore, StoreError};

/// Maximum query length in characters, after trimming / 查询最大长度
pub const MAX_QUERY_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("query parameter required")]
    Missing,
    #[error("query term too long")]
    TooLong,
    #[error("invalid query")]
    Uncompilable(#[from] CompileError),
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Validated search request / 已校验的搜索请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Trimmed query / 去除首尾空白后的查询
    pub query: String,
    pub mode: SearchMode,
    pub page: u32,
}

impl SearchRequest {
    /// Validate raw parameters / 校验原始参数
    ///
    /// `page` below 1 becomes 1; mode is taken as given.
    pub fn new(query: Option<&str>, mode: SearchMode, page: u32) -> Result<Self, ValidationError> {
        let query = query.map(str::trim).unwrap_or_default();
        if query.is_empty() {
            return Err(ValidationError::Missing);
        }
        if query.chars().count() > MAX_QUERY_CHARS {
            return Err(ValidationError::TooLong);
        }
        Ok(Self {
            query: query.to_string(),
            mode,
            page: page.max(1),
        })
    }
}

/// One page of results plus the full count / 一页结果及总数
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchPage {
    pub results: Vec<SearchResult>,
    pub total: u64,
}

#[derive(Clone)]
pub struct SearchService {
    store: Arc<dyn DictStore>,
    compiler: QueryCompiler,
    timeout: Duration,
}

impl SearchService {
    pub fn new(store: Arc<dyn DictStore>, compiler: QueryCompiler, timeout: Duration) -> Self {
        Self { store, compiler, timeout }
    }

    pub fn compile(&self, req: &SearchRequest) -> Result<CompiledQuery, ValidationError> {
        Ok(self.compiler.compile(&req.query, req.mode.column())?)
    }

    /// Run a search; both store reads are issued concurrently / 执行搜索
    pub async fn search(&self, req: &SearchRequest) -> Result<SearchPage, SearchError> {
        let compiled = self.compile(req)?;

        let (rows, total) = tokio::try_join!(
            self.with_timeout(self.store.fetch_matches(&compiled)),
            self.with_timeout(self.store.count_pairs(&compiled)),
        )?;

        let ranked = ranking::aggregate(rows, compiled.column, &compiled.exact_term);
        if ranked.len() as u64 != total {
            tracing::warn!(
                "count mismatch for {:?}: ranked {} vs counted {}",
                compiled.expression, ranked.len(), total
            );
        }

        let results = pagination::window(ranked, req.page);
        tracing::debug!("search {:?} page {} -> {} of {}", req.query, req.page, results.len(), total);

        Ok(SearchPage { results, total })
    }

    async fn with_timeout<T>(
        &self,
        fut: impl std::future::Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(res) => res,
            Err(_) => Err(StoreError::Timeout(self.timeout)),
        }
    }
}
