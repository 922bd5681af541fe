//! Search module - dictionary lookup core / 搜索模块
//!
//! Pipeline / 流程：
//! raw query → tokenizer → compiler (FTS5 expression + exact term)
//! → store (matches, distinct-pair count, issued concurrently)
//! → ranking (weight, fold per mod, fold per pair, order) → page window
//!
//! Index features / 索引特性：
//! - SQLite FTS5 over `origin_name` / `trans_name`
//! - CJK-aware clauses: short CJK runs also match as prefixes
//! - Every user value is quoted; expression and exact term are bound parameters

pub mod cache;
pub mod compiler;
pub mod pagination;
pub mod ranking;
pub mod schema;
pub mod service;
pub mod store;
pub mod tokenizer;

pub use cache::{cache_key, MemoryCache, ResponseCache};
pub use compiler::{CompileError, CompileOptions, CompiledQuery, ExcludeStyle, ExpandStyle, QueryCompiler};
pub use pagination::PAGE_SIZE;
pub use schema::{Column, DictionaryEntry, RawMatch, SearchMode, SearchResult};
pub use service::{SearchError, SearchPage, SearchRequest, SearchService, ValidationError, MAX_QUERY_CHARS};
pub use store::{DictStore, SqliteStore, StoreError};
pub use tokenizer::{tokenize, Token, TokenKind};
