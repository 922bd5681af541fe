use sqlx::SqlitePool;
use anyhow::Result;

/// Run database migrations / 运行数据库迁移
///
/// Creates `dict`, the `dict_fts` external-content index and the triggers
/// that keep them aligned. Existing data is never dropped.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS dict (
            origin_name TEXT,
            trans_name TEXT,
            modid TEXT,
            version TEXT,
            key TEXT,
            curseforge TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE VIRTUAL TABLE IF NOT EXISTS dict_fts USING fts5(
            origin_name,
            trans_name,
            content='dict',
            content_rowid='rowid'
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TRIGGER IF NOT EXISTS dict_ai AFTER INSERT ON dict BEGIN
            INSERT INTO dict_fts(rowid, origin_name, trans_name)
            VALUES (new.rowid, new.origin_name, new.trans_name);
        END
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TRIGGER IF NOT EXISTS dict_ad AFTER DELETE ON dict BEGIN
            INSERT INTO dict_fts(dict_fts, rowid, origin_name, trans_name)
            VALUES ('delete', old.rowid, old.origin_name, old.trans_name);
        END
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TRIGGER IF NOT EXISTS dict_au AFTER UPDATE ON dict BEGIN
            INSERT INTO dict_fts(dict_fts, rowid, origin_name, trans_name)
            VALUES ('delete', old.rowid, old.origin_name, old.trans_name);
            INSERT INTO dict_fts(rowid, origin_name, trans_name)
            VALUES (new.rowid, new.origin_name, new.trans_name);
        END
        "#,
    )
    .execute(pool)
    .await?;

    // 旧库导入时可能只有 dict 数据，索引为空
    if fts_out_of_sync(pool).await? {
        rebuild_fts(pool).await?;
    }

    Ok(())
}

/// Whether the index holds a different number of rows than `dict` / 索引是否与词典不同步
async fn fts_out_of_sync(pool: &SqlitePool) -> Result<bool> {
    let dict_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM dict")
        .fetch_one(pool)
        .await?;
    // dict_fts 是外部内容表，COUNT(*) 会读 dict 本身，所以统计 docsize 影子表
    let indexed_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM dict_fts_docsize")
        .fetch_one(pool)
        .await?;
    Ok(dict_rows != indexed_rows)
}

/// Rebuild `dict_fts` from `dict` / 重建全文索引
pub async fn rebuild_fts(pool: &SqlitePool) -> Result<()> {
    tracing::info!("Rebuilding dict_fts from dict...");
    sqlx::query("INSERT INTO dict_fts(dict_fts) VALUES ('rebuild')")
        .execute(pool)
        .await?;
    tracing::info!("dict_fts rebuilt");
    Ok(())
}
