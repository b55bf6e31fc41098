//! Case store trait abstraction.

use async_trait::async_trait;
use caseforge_core::{Case, CaseId, CaseStatus};

/// Error type for case store operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during case store operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Item not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Case store abstraction.
///
/// Cases are keyed by a globally unique case id and carry a per-document
/// slug unique across all documents. The production loop reads cases and
/// writes back terminal statuses only; everything else here exists for
/// seeding and local operation.
#[async_trait]
pub trait CaseStore: Send + Sync {
    /// Load a case by id.
    async fn get_case(&self, id: &CaseId) -> Result<Option<Case>>;

    /// Insert or update a case.
    async fn upsert_case(&self, case: &Case) -> Result<()>;

    /// Update a case's lifecycle status.
    async fn set_status(&self, id: &CaseId, status: CaseStatus) -> Result<()>;

    /// List cases still waiting to be processed.
    async fn list_todo(&self, limit: usize) -> Result<Vec<Case>>;

    /// Plain text of the most recently published documents, newest first.
    ///
    /// Documents whose text cannot be retrieved are skipped, not returned
    /// as empty entries.
    async fn list_recent_accepted(&self, limit: usize) -> Result<Vec<String>>;

    /// Remove rows with a missing id or slug; returns the number deleted.
    async fn cleanup_null_cases(&self) -> Result<u64>;

    /// Count published cases.
    async fn count_published(&self) -> Result<u64>;
}
