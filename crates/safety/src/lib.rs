//! Safety review for generated documents.
//!
//! Classifies a document into PASS / EDIT / DISCARD through three ordered
//! stages: a hard denylist, a soft heuristic denylist, and a best-effort
//! external semantic check. The string stages are hard gates; only the
//! semantic stage fails open.

#![warn(missing_docs)]

pub mod reviewer;
pub mod semantic;

pub use reviewer::SafetyReviewer;
pub use semantic::{OpenAiClassifier, SemanticClassifier, SemanticOpinion};
