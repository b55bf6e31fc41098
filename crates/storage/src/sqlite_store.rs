//! SQLite case store.
//!
//! Cases are stored as JSON rows with the id, slug, and status broken out
//! into indexed columns so lifecycle queries stay plain SQL.

use async_trait::async_trait;
use caseforge_core::{Case, CaseId, CaseStatus};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use sqlx::Row;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::trait_::{CaseStore, Result, StorageError};

/// SQLite case store implementation.
#[derive(Clone)]
pub struct SqliteCaseStore {
    /// Database connection pool
    pool: SqlitePool,

    /// Directory holding rendered artifacts, read back for the
    /// similarity corpus
    public_dir: PathBuf,
}

impl SqliteCaseStore {
    /// Open (creating if needed) a case database at the given path.
    pub async fn new(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        let store = Self {
            pool,
            public_dir: PathBuf::from("public"),
        };
        store.init_schema().await?;
        Ok(store)
    }

    /// Create an in-memory case store for testing.
    ///
    /// Pinned to a single pooled connection: each `:memory:` connection
    /// is its own database, so handing out more would lose the schema.
    pub async fn in_memory() -> Result<Self> {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        let store = Self {
            pool,
            public_dir: PathBuf::from("public"),
        };
        store.init_schema().await?;
        Ok(store)
    }

    /// Override the directory rendered artifacts are read back from.
    pub fn with_public_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.public_dir = dir.into();
        self
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS cases (
                case_id TEXT PRIMARY KEY,
                slug TEXT UNIQUE,
                status TEXT NOT NULL DEFAULT 'todo',
                data TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_cases_status ON cases(status)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    fn row_to_case(row: &sqlx::sqlite::SqliteRow) -> Result<Case> {
        let data: String = row.try_get("data").map_err(StorageError::Database)?;
        let mut case: Case = serde_json::from_str(&data)?;
        // The status column is authoritative; set_status only touches it.
        let status: String = row.try_get("status").unwrap_or_default();
        case.status = CaseStatus::parse(&status);
        Ok(case)
    }

    /// Read a rendered artifact back as plain text, stripping markup.
    fn load_artifact_text(&self, slug: &str) -> Option<String> {
        let path = self.public_dir.join(format!("{slug}.html"));
        let html = std::fs::read_to_string(path).ok()?;
        let tags = regex::Regex::new(r"<[^>]+>").ok()?;
        Some(tags.replace_all(&html, " ").into_owned())
    }
}

#[async_trait]
impl CaseStore for SqliteCaseStore {
    async fn get_case(&self, id: &CaseId) -> Result<Option<Case>> {
        let row = sqlx::query("SELECT status, data FROM cases WHERE case_id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(Self::row_to_case(&row)?)),
            None => Ok(None),
        }
    }

    async fn upsert_case(&self, case: &Case) -> Result<()> {
        let data = serde_json::to_string(case)?;
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO cases (case_id, slug, status, data, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(case_id) DO UPDATE SET
                slug = excluded.slug,
                status = excluded.status,
                data = excluded.data,
                updated_at = excluded.updated_at",
        )
        .bind(case.case_id.as_str())
        .bind(case.slug.as_deref())
        .bind(case.status.as_str())
        .bind(data)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_status(&self, id: &CaseId, status: CaseStatus) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        let result = sqlx::query("UPDATE cases SET status = ?, updated_at = ? WHERE case_id = ?")
            .bind(status.as_str())
            .bind(&now)
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn list_todo(&self, limit: usize) -> Result<Vec<Case>> {
        let rows = sqlx::query("SELECT status, data FROM cases WHERE status = 'todo' LIMIT ?")
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        let mut cases = Vec::with_capacity(rows.len());
        for row in &rows {
            cases.push(Self::row_to_case(row)?);
        }
        Ok(cases)
    }

    async fn list_recent_accepted(&self, limit: usize) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT slug FROM cases WHERE status = 'published'
             ORDER BY created_at DESC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut texts = Vec::new();
        for row in &rows {
            let slug: Option<String> = row.try_get("slug").unwrap_or(None);
            let Some(slug) = slug.filter(|s| !s.is_empty()) else {
                continue;
            };
            match self.load_artifact_text(&slug) {
                Some(text) => texts.push(text),
                None => warn!("published artifact missing for slug {slug}, skipping"),
            }
        }
        Ok(texts)
    }

    async fn cleanup_null_cases(&self) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM cases WHERE case_id = '' OR slug IS NULL OR slug = ''",
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn count_published(&self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM cases WHERE status = 'published'")
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = row.try_get("cnt").unwrap_or(0);
        Ok(count as u64)
    }
}
