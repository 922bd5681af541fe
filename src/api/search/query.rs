use axum::{
    extract::{Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::search::cache_key;
use crate::state::AppState;
use super::types::*;

/// Cache status header / 缓存命中标记
pub const CACHE_STATUS_HEADER: &str = "x-cache";

fn json_response(body: String, cache_status: &'static str) -> Response {
    let mut resp = body.into_response();
    let headers = resp.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(CACHE_STATUS_HEADER, HeaderValue::from_static(cache_status));
    resp
}

/// GET /search?q=&page=&mode= - 词典搜索
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Response, ApiError> {
    let req = params.into_request()?;
    let key = cache_key(&req.query, req.page, req.mode);

    if let Some(body) = state.cache.get(&key).await {
        tracing::debug!("cache hit: {}", key);
        return Ok(json_response(body, "HIT"));
    }

    let page = state.search.search(&req).await?;

    let body = SearchResponse {
        query: req.query,
        results: page.results,
        total: page.total,
        page: req.page,
        mode: req.mode,
    };
    let body = serde_json::to_string(&body)?;

    // 缓存写入不阻塞响应
    let cache = state.cache.clone();
    let ttl = state.cache_ttl;
    let cached = body.clone();
    tokio::spawn(async move {
        cache.put(&key, cached, ttl).await;
    });

    Ok(json_response(body, "MISS"))
}
