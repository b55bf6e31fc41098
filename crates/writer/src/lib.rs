//! Draft generation for the production loop.
//!
//! The `Writer` trait is the generator collaborator boundary: it turns a
//! case plus planning context into a content document, or refines a
//! previous draft using failure feedback. Returning `None` signals a
//! generation failure that the production loop consumes as a retryable
//! attempt.

#![warn(missing_docs)]

pub mod openai;

use async_trait::async_trait;
use caseforge_core::{Case, ContentDocument, PlanningInfo};

pub use openai::OpenAiWriter;
pub use safe_test::safe_test_document;

/// Generation mode selected by the production loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterMode {
    /// Call the live generation service.
    Live,
    /// Return the fixed, denylist-free test document.
    SafeTest,
}

/// Generator collaborator.
///
/// Implementations must tolerate missing optional case fields and must
/// not panic on service failure; `None` is the failure signal.
#[async_trait]
pub trait Writer: Send + Sync {
    /// Produce a fresh draft for a case.
    async fn generate(
        &self,
        case: &Case,
        planning: &PlanningInfo,
        mode: WriterMode,
    ) -> Option<ContentDocument>;

    /// Rewrite a previous draft using the failure feedback.
    async fn refine(
        &self,
        case: &Case,
        previous_text: &str,
        feedback: &str,
        planning: &PlanningInfo,
        mode: WriterMode,
    ) -> Option<ContentDocument>;
}
