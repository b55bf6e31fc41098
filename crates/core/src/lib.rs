//! caseforge core data models.
//!
//! This crate defines the domain types shared by every stage of the
//! content production pipeline: the immutable case record, the planning
//! projection handed to evaluators, the generated content document, and
//! the verdict/score/outcome values produced by the gating loop.

#![warn(missing_docs)]

mod case;
mod document;
mod id;
mod outcome;
mod scores;
mod verdict;

pub use case::{Case, CaseStatus, FaqPair, PlanningInfo};
pub use document::ContentDocument;
pub use id::CaseId;
pub use outcome::{Attempt, CaseOutcome, OutcomeStatus, ProductionState};
pub use scores::{PuiScore, QualityScores};
pub use verdict::{SafetyStatus, SafetyVerdict, VerdictSource};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
