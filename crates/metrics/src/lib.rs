//! Outcome metrics logging.
//!
//! One CSV row per terminal event. Metrics that were never computed are
//! recorded as empty fields, not zeros, so downstream analysis can tell
//! "failed before scoring" apart from "scored zero".

#![warn(missing_docs)]

use async_trait::async_trait;
use caseforge_core::{OutcomeStatus, PuiScore, SafetyStatus};
use std::path::PathBuf;
use tracing::debug;

/// Error type for metrics operations.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// I/O error writing the log
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Column order of the outcome log. The header row written on first use
/// must match this exactly.
const COLUMNS: [&str; 17] = [
    "timestamp",
    "case_id",
    "slug",
    "status",
    "reason",
    "safety_status",
    "similarity_score",
    "uniqueness_score",
    "unique_block_count",
    "word_count",
    "pui_total",
    "pui_structure",
    "pui_data",
    "pui_eeat",
    "user_intent",
    "structure_type",
    "domain_type",
];

/// One terminal (or terminal-retry) event.
#[derive(Debug, Clone)]
pub struct OutcomeRecord {
    /// Case identifier
    pub case_id: String,

    /// Resolved slug, possibly empty
    pub slug: String,

    /// Terminal status
    pub status: OutcomeStatus,

    /// Failure reason, if any
    pub reason: Option<String>,

    /// Last safety status observed
    pub safety_status: Option<SafetyStatus>,

    /// Last similarity score computed
    pub similarity: Option<f64>,

    /// Last uniqueness score computed
    pub uniqueness: Option<f64>,

    /// Last unique block count computed
    pub unique_blocks: Option<usize>,

    /// Word count of the last flattened document
    pub word_count: Option<usize>,

    /// Last PUI scores computed
    pub pui: Option<PuiScore>,

    /// Case user intent
    pub user_intent: Option<String>,

    /// Case structure type
    pub structure_type: Option<String>,

    /// Case domain category
    pub domain_type: String,
}

/// Append-only outcome sink.
#[async_trait]
pub trait MetricsSink: Send + Sync {
    /// Record one terminal event.
    async fn record(&self, record: &OutcomeRecord) -> Result<(), MetricsError>;
}

/// CSV file sink.
pub struct CsvMetricsSink {
    path: PathBuf,
}

impl CsvMetricsSink {
    /// Log to the given CSV file, creating it (with a header row) on
    /// first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn format_float(value: Option<f64>) -> String {
        value.map(|v| format!("{v:.4}")).unwrap_or_default()
    }

    fn format_count(value: Option<usize>) -> String {
        value.map(|v| v.to_string()).unwrap_or_default()
    }
}

#[async_trait]
impl MetricsSink for CsvMetricsSink {
    async fn record(&self, record: &OutcomeRecord) -> Result<(), MetricsError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let needs_header = !self.path.exists();
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            writer.write_record(COLUMNS)?;
        }

        let pui = record.pui;
        writer.write_record([
            chrono::Utc::now().to_rfc3339(),
            record.case_id.clone(),
            record.slug.clone(),
            record.status.as_str().to_string(),
            record.reason.clone().unwrap_or_default(),
            record
                .safety_status
                .map(|s| s.as_str().to_string())
                .unwrap_or_default(),
            Self::format_float(record.similarity),
            Self::format_float(record.uniqueness),
            Self::format_count(record.unique_blocks),
            Self::format_count(record.word_count),
            Self::format_count(pui.map(|p| p.total as usize)),
            Self::format_count(pui.map(|p| p.structure as usize)),
            Self::format_count(pui.map(|p| p.data as usize)),
            Self::format_count(pui.map(|p| p.eeat as usize)),
            record.user_intent.clone().unwrap_or_default(),
            record.structure_type.clone().unwrap_or_default(),
            record.domain_type.clone(),
        ])?;
        writer.flush()?;

        debug!(case_id = %record.case_id, status = %record.status, "recorded outcome");
        Ok(())
    }
}
