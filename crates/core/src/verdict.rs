//! Safety classification results.

use serde::{Deserialize, Serialize};

/// Safety classification of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SafetyStatus {
    /// Safe to publish
    Pass,
    /// Needs rewriting before publishing
    Edit,
    /// Unsalvageable, reject the attempt
    Discard,
}

impl SafetyStatus {
    /// Stable string form used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            SafetyStatus::Pass => "PASS",
            SafetyStatus::Edit => "EDIT",
            SafetyStatus::Discard => "DISCARD",
        }
    }
}

impl std::fmt::Display for SafetyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which review stage produced a verdict.
///
/// The reviewer runs its stages in a fixed order and short-circuits, so
/// tests can assert on the stage without depending on collaborator
/// behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerdictSource {
    /// Hard denylist substring match
    HardDenylist,
    /// Soft heuristic denylist substring match
    SoftDenylist,
    /// External semantic classifier opinion
    Semantic,
    /// Semantic classifier unavailable, fail-open pass
    SemanticSkipped,
}

/// Verdict produced by one safety review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyVerdict {
    /// Classification
    pub status: SafetyStatus,

    /// Risk estimate, 0 (clean) to 100
    pub risk_score: u8,

    /// Human-readable reason, listing matched phrases where applicable
    pub reason: String,

    /// Softened rewrite suggested by the semantic stage, if any
    pub refined_content: Option<String>,

    /// Stage that decided
    pub source: VerdictSource,
}

impl SafetyVerdict {
    /// Whether the verdict blocks publication.
    pub fn is_blocking(&self) -> bool {
        !matches!(self.status, SafetyStatus::Pass)
    }
}
