//! Dictionary store - read side over `dict` + `dict_fts` / 词典存储
//!
//! 存储方案：
//! - dict 表：原始词条（每个模组版本一行）
//! - dict_fts 表：FTS5 外部内容索引（origin_name / trans_name），按 rowid 对齐
//!
//! The search surface is read-only. `insert_entries` exists for imports and
//! tests; the FTS index follows `dict` through triggers created in `db.rs`.

use async_trait::async_trait;
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::time::Duration;
use thiserror::Error;

use super::compiler::CompiledQuery;
use super::schema::{DictionaryEntry, RawMatch};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("store query timed out after {0:?}")]
    Timeout(Duration),
}

impl StoreError {
    /// Whether the caller may retry the same request / 是否可重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Timeout(_))
    }
}

/// Read operations the search core needs / 搜索核心所需的读操作
#[async_trait]
pub trait DictStore: Send + Sync {
    /// All rows matching the expression, with their FTS rank / 全部匹配行
    async fn fetch_matches(&self, query: &CompiledQuery) -> Result<Vec<RawMatch>, StoreError>;

    /// Distinct `(origin_name, trans_name)` pairs matching the expression / 去重词对数
    async fn count_pairs(&self, query: &CompiledQuery) -> Result<u64, StoreError>;
}

const FETCH_MATCHES_SQL: &str = r#"
    SELECT d.rowid AS row_id,
           COALESCE(d.origin_name, '') AS origin_name,
           COALESCE(d.trans_name, '') AS trans_name,
           d.modid, d.version, d.key, d.curseforge,
           dict_fts.rank AS rank
    FROM dict_fts
    JOIN dict d ON d.rowid = dict_fts.rowid
    WHERE dict_fts MATCH ?
    ORDER BY dict_fts.rank, d.rowid
    LIMIT ?
"#;

const COUNT_PAIRS_SQL: &str = r#"
    SELECT COUNT(*) FROM (
        SELECT DISTINCT COALESCE(d.origin_name, ''), COALESCE(d.trans_name, '')
        FROM dict_fts
        JOIN dict d ON d.rowid = dict_fts.rowid
        WHERE dict_fts MATCH ?
    )
"#;

/// SQLite-backed dictionary / SQLite 词典存储
///
/// `match_limit` caps the rows one search loads, best rank first. Pairs past
/// the cap drop out of the ranked list while `count_pairs` still reports them.
#[derive(Clone)]
pub struct SqliteStore {
    db: Pool<Sqlite>,
    match_limit: Option<u32>,
}

impl SqliteStore {
    /// 使用现有数据库连接池
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db, match_limit: None }
    }

    /// Cap rows per search; `None` loads every match / 单次搜索加载行数上限
    pub fn with_match_limit(mut self, limit: Option<u32>) -> Self {
        self.match_limit = limit.filter(|n| *n > 0);
        self
    }

    /// Open a pool for `database_url` with WAL enabled / 打开数据库（WAL模式）
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let db = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        // 启用WAL模式，提高并发读性能
        sqlx::query("PRAGMA journal_mode=WAL").execute(&db).await?;
        // 设置busy_timeout，避免锁超时
        sqlx::query("PRAGMA busy_timeout=5000").execute(&db).await?;

        tracing::info!("Dictionary database opened: {} (WAL mode)", database_url);
        Ok(Self::new(db))
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.db
    }

    /// 批量插入词条（单个事务）
    pub async fn insert_entries(&self, entries: &[DictionaryEntry]) -> Result<(), StoreError> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut tx = self.db.begin().await?;

        for e in entries {
            sqlx::query(
                "INSERT INTO dict (origin_name, trans_name, modid, version, key, curseforge) VALUES (?, ?, ?, ?, ?, ?)"
            )
            .bind(&e.origin_name)
            .bind(&e.trans_name)
            .bind(&e.modid)
            .bind(&e.version)
            .bind(&e.key)
            .bind(&e.curseforge)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Number of rows in `dict` / 词条总数
    pub async fn entry_count(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM dict")
            .fetch_one(&self.db)
            .await?;
        Ok(count.max(0) as u64)
    }
}

#[async_trait]
impl DictStore for SqliteStore {
    async fn fetch_matches(&self, query: &CompiledQuery) -> Result<Vec<RawMatch>, StoreError> {
        // SQLite 中 LIMIT -1 表示不限制
        let limit = self.match_limit.map(i64::from).unwrap_or(-1);
        let rows: Vec<RawMatch> = sqlx::query_as(FETCH_MATCHES_SQL)
            .bind(&query.expression)
            .bind(limit)
            .fetch_all(&self.db)
            .await?;
        if self.match_limit.is_some_and(|n| rows.len() as u64 >= u64::from(n)) {
            tracing::warn!("match limit reached for {:?}: {} rows loaded", query.expression, rows.len());
        } else {
            tracing::debug!("fts matched {} rows for {:?}", rows.len(), query.expression);
        }
        Ok(rows)
    }

    async fn count_pairs(&self, query: &CompiledQuery) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar(COUNT_PAIRS_SQL)
            .bind(&query.expression)
            .fetch_one(&self.db)
            .await?;
        Ok(count.max(0) as u64)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db;
    use crate::search::compiler::{CompileOptions, ExpandStyle, QueryCompiler};
    use crate::search::schema::Column;

    pub(crate) fn entry(origin: &str, trans: &str, modid: &str, version: &str) -> DictionaryEntry {
        DictionaryEntry {
            origin_name: origin.to_string(),
            trans_name: trans.to_string(),
            modid: Some(modid.to_string()),
            version: Some(version.to_string()),
            key: Some(format!("{}.{}", modid, origin.to_lowercase().replace(' ', "_"))),
            curseforge: None,
        }
    }

    /// In-memory store with the real schema; one connection so every query sees the same database.
    pub(crate) async fn memory_store(entries: &[DictionaryEntry]) -> SqliteStore {
        let store = SqliteStore::connect("sqlite::memory:", 1).await.unwrap();
        db::run_migrations(store.pool()).await.unwrap();
        store.insert_entries(entries).await.unwrap();
        store
    }

    async fn origins(store: &SqliteStore, raw: &str, compiler: QueryCompiler) -> Vec<String> {
        let q = compiler.compile(raw, Column::OriginName).unwrap();
        let mut names: Vec<String> = store
            .fetch_matches(&q)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.entry.origin_name)
            .collect();
        names.sort();
        names.dedup();
        names
    }

    #[tokio::test]
    async fn test_fetch_and_count() {
        let store = memory_store(&[
            entry("Torch", "火把", "minecraft", "1.20"),
            entry("Torch", "火把", "tconstruct", "3.6"),
            entry("Torch", "火把", "create", "0.5"),
            entry("Redstone Torch", "红石火把", "minecraft", "1.20"),
            entry("Stone", "石头", "minecraft", "1.20"),
        ])
        .await;

        let q = QueryCompiler::default().compile("torch", Column::OriginName).unwrap();
        let rows = store.fetch_matches(&q).await.unwrap();
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r.rank.is_finite()));
        assert_eq!(store.count_pairs(&q).await.unwrap(), 2);
        assert_eq!(store.entry_count().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_exclude_removes_rows() {
        let store = memory_store(&[
            entry("he llo", "甲", "a", "1"),
            entry("he said", "乙", "a", "1"),
            entry("llo", "丙", "a", "1"),
        ])
        .await;
        assert_eq!(origins(&store, "he -llo", QueryCompiler::default()).await, vec!["he said"]);
    }

    #[tokio::test]
    async fn test_expand_styles() {
        let store = memory_store(&[
            entry("gear", "齿轮", "create", "1"),
            entry("gears", "齿轮组", "create", "1"),
            entry("gearbox", "齿轮箱", "create", "1"),
            entry("gear shift", "换挡", "create", "1"),
        ])
        .await;

        let observed = QueryCompiler::default();
        assert_eq!(origins(&store, "gear+", observed).await, vec!["gearbox", "gears"]);

        let prefix_only = QueryCompiler::new(CompileOptions {
            expand: ExpandStyle::PrefixOnly,
            ..Default::default()
        });
        assert_eq!(
            origins(&store, "gear+", prefix_only).await,
            vec!["gear", "gear shift", "gearbox", "gears"]
        );
    }

    #[tokio::test]
    async fn test_cjk_prefix_union() {
        let store = memory_store(&[
            entry("Torch", "火把", "minecraft", "1"),
            entry("Torch Holder", "火把架", "minecraft", "1"),
            entry("Stone", "石头", "minecraft", "1"),
        ])
        .await;
        let q = QueryCompiler::default().compile("火把", Column::TransName).unwrap();
        assert_eq!(store.fetch_matches(&q).await.unwrap().len(), 2);
        assert_eq!(store.count_pairs(&q).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_match_limit_keeps_best_rows_and_full_count() {
        let rows: Vec<DictionaryEntry> = (0..200)
            .map(|i| entry(&format!("gear {}", i), &format!("齿轮{}", i), "create", "1"))
            .chain(std::iter::once(entry("gear", "齿轮", "create", "1")))
            .collect();
        let store = memory_store(&rows).await.with_match_limit(Some(50));

        let q = QueryCompiler::default().compile("gear", Column::OriginName).unwrap();
        let matches = store.fetch_matches(&q).await.unwrap();
        assert_eq!(matches.len(), 50);
        // 最短的文档相关度最高
        assert!(matches.iter().any(|m| m.entry.origin_name == "gear"));
        assert_eq!(store.count_pairs(&q).await.unwrap(), 201);

        let unlimited = store.clone().with_match_limit(None);
        assert_eq!(unlimited.fetch_matches(&q).await.unwrap().len(), 201);
        let zero = store.with_match_limit(Some(0));
        assert_eq!(zero.fetch_matches(&q).await.unwrap().len(), 201);
    }

    #[tokio::test]
    async fn test_no_match_is_empty() {
        let store = memory_store(&[entry("Torch", "火把", "minecraft", "1")]).await;
        let q = QueryCompiler::default().compile("anvil", Column::OriginName).unwrap();
        assert!(store.fetch_matches(&q).await.unwrap().is_empty());
        assert_eq!(store.count_pairs(&q).await.unwrap(), 0);
    }
}
