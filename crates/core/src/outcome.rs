//! Attempt bookkeeping and terminal outcomes.

use crate::scores::{PuiScore, QualityScores};
use crate::verdict::SafetyStatus;
use serde::{Deserialize, Serialize};

/// States of the production loop.
///
/// The loop is linear per attempt: DRAFTING -> SAFETY_CHECK ->
/// QUALITY_CHECK -> PUBLISHING, ending in PUBLISHED or DISCARDED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductionState {
    /// Requesting a draft or refinement from the generator
    Drafting,
    /// Running the safety reviewer
    SafetyCheck,
    /// Running similarity / uniqueness / PUI scoring
    QualityCheck,
    /// Rendering and persisting
    Publishing,
    /// Terminal: artifact persisted
    Published,
    /// Terminal: rejected
    Discarded,
}

/// One iteration of the retry loop.
///
/// The attempt value is threaded functionally from one iteration to the
/// next: a failed attempt produces the next one via [`Attempt::retry`],
/// carrying the feedback and previous text forward along with the most
/// recently computed metrics. Only the terminal attempt's metadata gets
/// persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    /// 1-based attempt number
    pub number: u32,

    /// Failure feedback carried in from the previous attempt
    pub feedback: Option<String>,

    /// Flattened text of the previous attempt's best candidate
    pub previous_text: Option<String>,

    /// Safety status of the most recent review
    pub safety_status: Option<SafetyStatus>,

    /// Most recent similarity score
    pub similarity: Option<f64>,

    /// Most recent uniqueness score
    pub uniqueness: Option<f64>,

    /// Most recent unique block count
    pub unique_blocks: Option<usize>,

    /// Word count of the most recent flattened document
    pub word_count: Option<usize>,

    /// Most recent PUI scores
    pub pui: Option<PuiScore>,
}

impl Attempt {
    /// The first attempt: no feedback, nothing measured yet.
    pub fn first() -> Self {
        Self {
            number: 1,
            feedback: None,
            previous_text: None,
            safety_status: None,
            similarity: None,
            uniqueness: None,
            unique_blocks: None,
            word_count: None,
            pui: None,
        }
    }

    /// Whether this is the initial draft attempt.
    pub fn is_first(&self) -> bool {
        self.number == 1
    }

    /// The complete quality evaluation, present once every metric has
    /// been computed for this attempt.
    pub fn quality_scores(&self) -> Option<QualityScores> {
        Some(QualityScores {
            similarity: self.similarity?,
            uniqueness: self.uniqueness?,
            unique_blocks: self.unique_blocks?,
            pui: self.pui?,
        })
    }

    /// Build the follow-up attempt after a failure.
    ///
    /// Metrics measured on the failed attempt are kept so a later terminal
    /// event can still report them.
    pub fn retry(self, feedback: impl Into<String>, previous_text: Option<String>) -> Self {
        Self {
            number: self.number + 1,
            feedback: Some(feedback.into()),
            previous_text: previous_text.or(self.previous_text),
            safety_status: self.safety_status,
            similarity: self.similarity,
            uniqueness: self.uniqueness,
            unique_blocks: self.unique_blocks,
            word_count: self.word_count,
            pui: self.pui,
        }
    }
}

/// Terminal status of one loop invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Artifact rendered and case marked published
    Published,
    /// Case marked discarded with a reason
    Discarded,
    /// Case could not be processed at all
    Error,
}

impl OutcomeStatus {
    /// Stable string form used by the metrics log.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Published => "published",
            OutcomeStatus::Discarded => "discarded",
            OutcomeStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal result of running the production loop for one case.
///
/// Exactly one outcome is produced per invocation; the loop never leaves
/// a case without a terminal status update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseOutcome {
    /// Terminal status
    pub status: OutcomeStatus,

    /// Reason code for discarded/error outcomes
    pub reason: Option<String>,

    /// Location of the rendered artifact for published outcomes
    pub artifact_path: Option<String>,

    /// Attempts consumed
    pub attempts: u32,
}

impl CaseOutcome {
    /// A published outcome with its artifact location.
    pub fn published(artifact_path: impl Into<String>, attempts: u32) -> Self {
        Self {
            status: OutcomeStatus::Published,
            reason: None,
            artifact_path: Some(artifact_path.into()),
            attempts,
        }
    }

    /// A discarded outcome with its reason.
    pub fn discarded(reason: impl Into<String>, attempts: u32) -> Self {
        Self {
            status: OutcomeStatus::Discarded,
            reason: Some(reason.into()),
            artifact_path: None,
            attempts,
        }
    }

    /// A non-retryable error outcome.
    pub fn error(reason: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Error,
            reason: Some(reason.into()),
            artifact_path: None,
            attempts: 0,
        }
    }
}
