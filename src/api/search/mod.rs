//! Search API / 搜索接口

pub mod query;
pub mod types;

pub use query::search;
pub use types::{ApiError, SearchParams, SearchResponse};
