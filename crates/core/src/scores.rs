//! Quality score values.

use serde::{Deserialize, Serialize};

/// Publish-Uniqueness-Integrity rubric scores.
///
/// Sub-scores are clamped to their caps (structure 40, data 35, EEAT 25)
/// and the total to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuiScore {
    /// Combined score, 0..=100
    pub total: u32,

    /// Structural fit sub-score, 0..=40
    pub structure: u32,

    /// Data richness sub-score, 0..=35
    pub data: u32,

    /// Disclaimer / expertise signal sub-score, 0..=25
    pub eeat: u32,
}

/// All quality metrics computed for one attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityScores {
    /// Maximum cosine similarity against the accepted corpus, 0..=1
    pub similarity: f64,

    /// 1 - similarity, clamped into 0..=1
    pub uniqueness: f64,

    /// Paragraphs containing at least one planning keyword
    pub unique_blocks: usize,

    /// Rubric scores
    pub pui: PuiScore,
}
