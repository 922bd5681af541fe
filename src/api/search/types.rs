use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::search::{SearchError, SearchMode, SearchRequest, SearchResult, ValidationError};

/// 搜索请求参数（原始查询串）
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub page: Option<String>,
    pub mode: Option<String>,
}

impl SearchParams {
    /// 页码：缺失或非数字时为 1
    pub fn page(&self) -> u32 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .unwrap_or(1)
            .max(1)
    }

    /// 模式：缺失或无法识别时为 en2zh
    pub fn mode(&self) -> SearchMode {
        self.mode.as_deref().and_then(SearchMode::parse).unwrap_or_default()
    }

    pub fn into_request(self) -> Result<SearchRequest, ValidationError> {
        let page = self.page();
        let mode = self.mode();
        SearchRequest::new(self.q.as_deref(), mode, page)
    }
}

/// 搜索响应
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchResult>,
    pub total: u64,
    pub page: u32,
    pub mode: SearchMode,
}

/// Handler error mapped onto status + JSON body / 处理器错误
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::Search(e.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Search(SearchError::Validation(e @ (ValidationError::Missing | ValidationError::TooLong))) => {
                (StatusCode::BAD_REQUEST, json!({ "error": e.to_string() }))
            }
            ApiError::Search(SearchError::Validation(ValidationError::Uncompilable(inner))) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "invalid query", "details": inner.to_string() }),
            ),
            ApiError::Search(SearchError::Store(e)) if e.is_retryable() => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "error": "search timed out, please retry", "details": e.to_string() }),
            ),
            ApiError::Search(SearchError::Store(e)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "database query failed", "details": e.to_string() }),
            ),
            ApiError::Encode(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "failed to encode response", "details": e.to_string() }),
            ),
        };

        if status.is_server_error() {
            tracing::error!("search failed: {}", self);
        }
        (status, Json(body)).into_response()
    }
}
