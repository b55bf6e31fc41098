//! Pipeline thresholds.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default ceiling on acceptable similarity against the corpus.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.4;
/// Default minimum PUI total required to publish.
pub const DEFAULT_MIN_PUI: u32 = 80;
/// Default number of recent accepted documents used as the corpus.
pub const DEFAULT_CORPUS_LIMIT: usize = 100;

/// Thresholds governing the quality gates.
///
/// Constructed explicitly and handed to the loop; there is no ambient
/// configuration lookup inside the gating code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Drafts scoring above this similarity get sent back.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Drafts totaling below this PUI score get sent back.
    #[serde(default = "default_min_pui")]
    pub min_pui_score: u32,

    /// How many recent accepted documents to compare against.
    #[serde(default = "default_corpus_limit")]
    pub corpus_limit: usize,
}

fn default_similarity_threshold() -> f64 {
    DEFAULT_SIMILARITY_THRESHOLD
}

fn default_min_pui() -> u32 {
    DEFAULT_MIN_PUI
}

fn default_corpus_limit() -> usize {
    DEFAULT_CORPUS_LIMIT
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            min_pui_score: DEFAULT_MIN_PUI,
            corpus_limit: DEFAULT_CORPUS_LIMIT,
        }
    }
}

impl PipelineConfig {
    /// Load thresholds from a JSON file.
    ///
    /// A missing or malformed file silently falls back to the defaults;
    /// individual missing keys fall back per key.
    pub fn load_or_default(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }
}
