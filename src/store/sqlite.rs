//! SQLite-backed document store. Documents live in a single table keyed by
//! path; a batch commit is one SQL transaction.

use crate::store::batch::apply_field_op;
use crate::store::{Document, DocumentStore, StoreError, WriteBatch, WriteOp};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnection, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;
use tracing::info;

/// Initialize the SQLite database with schema and pragmas.
pub async fn init_store(db_path: &str) -> Result<SqlitePool, sqlx::Error> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).ok();
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .after_connect(|conn, _meta| Box::pin(async move { configure_pragmas_conn(conn).await }))
        .connect(&format!("sqlite:{}?mode=rwc", db_path))
        .await?;

    run_migrations(&pool).await?;

    info!("Document store initialized at {}", db_path);
    Ok(pool)
}

async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let schema_sql = include_str!("schema.sql");

    for statement in schema_sql.split(';') {
        let trimmed = statement.trim();
        if !trimmed.is_empty() {
            sqlx::query(trimmed).execute(pool).await?;
        }
    }

    Ok(())
}

async fn configure_pragmas_conn(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&mut *conn)
        .await?;

    // journal_mode returns the actual mode set; must use fetch to get result
    let row = sqlx::query("PRAGMA journal_mode = WAL")
        .fetch_one(&mut *conn)
        .await?;
    let journal_mode: String = row.get(0);
    info!("SQLite journal_mode set to: {}", journal_mode);

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&mut *conn)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&mut *conn)
        .await?;

    Ok(())
}

pub struct SqliteStore {
    pool: SqlitePool,
    max_batch_ops: usize,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        SqliteStore {
            pool,
            max_batch_ops: 500,
        }
    }

    pub fn with_max_batch_ops(mut self, max_batch_ops: usize) -> Self {
        self.max_batch_ops = max_batch_ops;
        self
    }

    fn parse_row(path: String, body: String, version: i64) -> Result<Document, StoreError> {
        let body = serde_json::from_str(&body).map_err(|e| StoreError::Corrupt {
            path: path.clone(),
            detail: e.to_string(),
        })?;
        Ok(Document {
            path,
            body,
            version,
        })
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn get(&self, path: &str) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query("SELECT body, version FROM documents WHERE path = ?")
            .bind(path)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| {
            let body: String = r.get("body");
            let version: i64 = r.get("version");
            Self::parse_row(path.to_string(), body, version)
        })
        .transpose()
    }

    async fn list(&self, prefix: &str) -> Result<Vec<Document>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT path, body, version
            FROM documents
            WHERE path LIKE ? || '%'
            ORDER BY path ASC
            "#,
        )
        .bind(prefix)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| {
                let path: String = r.get("path");
                let body: String = r.get("body");
                let version: i64 = r.get("version");
                Self::parse_row(path, body, version)
            })
            .collect()
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        // Preconditions first: any stale version aborts before a single write.
        for check in &batch.preconditions {
            let row = sqlx::query("SELECT version FROM documents WHERE path = ?")
                .bind(&check.path)
                .fetch_optional(&mut *tx)
                .await?;
            let found = row.map(|r| r.get::<i64, _>("version")).unwrap_or(0);
            if found != check.expected {
                return Err(StoreError::Conflict {
                    path: check.path.clone(),
                    expected: check.expected,
                    found,
                });
            }
        }

        for op in &batch.ops {
            match op {
                WriteOp::Set { path, body } => {
                    let body_str = body.to_string();
                    sqlx::query(
                        r#"
                        INSERT INTO documents (path, body, version)
                        VALUES (?, ?, 1)
                        ON CONFLICT(path) DO UPDATE SET
                            body = excluded.body,
                            version = documents.version + 1,
                            updated_at = datetime('now')
                        "#,
                    )
                    .bind(path)
                    .bind(body_str)
                    .execute(&mut *tx)
                    .await?;
                }
                WriteOp::Delete { path } => {
                    sqlx::query("DELETE FROM documents WHERE path = ?")
                        .bind(path)
                        .execute(&mut *tx)
                        .await?;
                }
                field_op => {
                    let path = field_op.path().to_string();
                    let row = sqlx::query("SELECT body FROM documents WHERE path = ?")
                        .bind(&path)
                        .fetch_optional(&mut *tx)
                        .await?
                        .ok_or_else(|| StoreError::Missing(path.clone()))?;

                    let body_str: String = row.get("body");
                    let mut body =
                        serde_json::from_str(&body_str).map_err(|e| StoreError::Corrupt {
                            path: path.clone(),
                            detail: e.to_string(),
                        })?;
                    apply_field_op(&path, &mut body, field_op)?;

                    sqlx::query(
                        r#"
                        UPDATE documents
                        SET body = ?, version = version + 1, updated_at = datetime('now')
                        WHERE path = ?
                        "#,
                    )
                    .bind(body.to_string())
                    .bind(&path)
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }

        tx.commit().await?;
        Ok(())
    }

    fn max_batch_ops(&self) -> usize {
        self.max_batch_ops
    }
}
