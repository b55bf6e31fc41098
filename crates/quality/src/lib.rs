//! Quality evaluation for generated documents.
//!
//! Two pure evaluators: a term-frequency cosine similarity engine scoring
//! a draft against the accepted corpus, and a heuristic scorer deriving
//! uniqueness, unique-block counts, and the composite PUI rubric.

#![warn(missing_docs)]

pub mod scoring;
pub mod similarity;

pub use scoring::{count_unique_blocks, pui_score, uniqueness};
pub use similarity::max_similarity;
