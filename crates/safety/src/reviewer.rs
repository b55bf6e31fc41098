//! Layered PASS / EDIT / DISCARD classification.

use caseforge_core::{SafetyStatus, SafetyVerdict, VerdictSource};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::semantic::SemanticClassifier;

/// Absolute-claim phrases that make a document unsalvageable.
const HARD_DENYLIST: [&str; 5] = [
    "100% recovery",
    "unconditional win",
    "guaranteed",
    "we represent you",
    "we take responsibility",
];

/// Hedge-violating phrases that require a rewrite.
const SOFT_DENYLIST: [&str; 6] = [
    "high chance of winning",
    "guaranteed outcome",
    "legal advice",
    "always",
    "never",
    "unconditionally",
];

/// Stateless safety reviewer.
///
/// The two denylist stages never fail open; the semantic stage is
/// best-effort and its absence must never block an otherwise clean
/// document.
pub struct SafetyReviewer {
    semantic: Option<Arc<dyn SemanticClassifier>>,
}

impl SafetyReviewer {
    /// A reviewer running only the string stages.
    pub fn new() -> Self {
        Self { semantic: None }
    }

    /// Attach an external semantic classifier for the third stage.
    pub fn with_semantic(semantic: Arc<dyn SemanticClassifier>) -> Self {
        Self {
            semantic: Some(semantic),
        }
    }

    /// Classify a flattened document.
    ///
    /// Stages run in order and short-circuit on the first that fires. The
    /// semantic collaborator is called at most once and never retried.
    pub async fn review(&self, text: &str) -> SafetyVerdict {
        let lower = text.to_lowercase();

        let hard_hits = matches(&lower, &HARD_DENYLIST);
        if !hard_hits.is_empty() {
            return SafetyVerdict {
                status: SafetyStatus::Discard,
                risk_score: 90,
                reason: format!("banned phrase detected: {}", hard_hits.join(", ")),
                refined_content: None,
                source: VerdictSource::HardDenylist,
            };
        }

        let soft_hits = matches(&lower, &SOFT_DENYLIST);
        if !soft_hits.is_empty() {
            return SafetyVerdict {
                status: SafetyStatus::Edit,
                risk_score: 60,
                reason: format!("absolute or guarantee tone detected: {}", soft_hits.join(", ")),
                refined_content: None,
                source: VerdictSource::SoftDenylist,
            };
        }

        if let Some(classifier) = &self.semantic {
            match classifier.classify(text).await {
                Ok(opinion) => {
                    debug!(status = %opinion.status, "semantic check returned");
                    let (risk_score, refined_content) = match opinion.status {
                        SafetyStatus::Discard => (85, opinion.refined_content),
                        SafetyStatus::Edit => (55, opinion.refined_content),
                        SafetyStatus::Pass => (5, None),
                    };
                    let reason = if opinion.reason.is_empty() {
                        "semantic pass".to_string()
                    } else {
                        opinion.reason
                    };
                    return SafetyVerdict {
                        status: opinion.status,
                        risk_score,
                        reason,
                        refined_content,
                        source: VerdictSource::Semantic,
                    };
                }
                Err(e) => {
                    warn!("semantic check failed, skipping soft audit: {e}");
                }
            }
        }

        // Absence of the semantic check must not block a clean document.
        SafetyVerdict {
            status: SafetyStatus::Pass,
            risk_score: 5,
            reason: "soft check skipped".to_string(),
            refined_content: None,
            source: VerdictSource::SemanticSkipped,
        }
    }
}

impl Default for SafetyReviewer {
    fn default() -> Self {
        Self::new()
    }
}

fn matches(lower_text: &str, denylist: &[&'static str]) -> Vec<&'static str> {
    denylist
        .iter()
        .copied()
        .filter(|phrase| lower_text.contains(phrase))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::SemanticOpinion;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedClassifier {
        opinion: SemanticOpinion,
        calls: AtomicUsize,
    }

    impl FixedClassifier {
        fn new(opinion: SemanticOpinion) -> Self {
            Self {
                opinion,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SemanticClassifier for FixedClassifier {
        async fn classify(&self, _text: &str) -> anyhow::Result<SemanticOpinion> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.opinion.clone())
        }
    }

    struct FailingClassifier;

    #[async_trait]
    impl SemanticClassifier for FailingClassifier {
        async fn classify(&self, _text: &str) -> anyhow::Result<SemanticOpinion> {
            anyhow::bail!("collaborator unavailable")
        }
    }

    #[tokio::test]
    async fn hard_denylist_discards_regardless_of_case() {
        let reviewer = SafetyReviewer::new();
        let verdict = reviewer
            .review("We promise 100% RECOVERY of your claim.")
            .await;
        assert_eq!(verdict.status, SafetyStatus::Discard);
        assert_eq!(verdict.risk_score, 90);
        assert_eq!(verdict.source, VerdictSource::HardDenylist);
        assert!(verdict.reason.contains("100% recovery"));
    }

    #[tokio::test]
    async fn hard_reason_lists_every_matched_phrase() {
        let reviewer = SafetyReviewer::new();
        let verdict = reviewer
            .review("An unconditional win, and we take responsibility.")
            .await;
        assert!(verdict.reason.contains("unconditional win"));
        assert!(verdict.reason.contains("we take responsibility"));
    }

    #[tokio::test]
    async fn soft_denylist_requests_an_edit() {
        let reviewer = SafetyReviewer::new();
        let verdict = reviewer
            .review("There is a high chance of winning this dispute.")
            .await;
        assert_eq!(verdict.status, SafetyStatus::Edit);
        assert_eq!(verdict.risk_score, 60);
        assert_eq!(verdict.source, VerdictSource::SoftDenylist);
        assert!(verdict.refined_content.is_none());
    }

    #[tokio::test]
    async fn hard_stage_wins_over_soft() {
        let reviewer = SafetyReviewer::new();
        let verdict = reviewer
            .review("We represent you and there is a high chance of winning.")
            .await;
        assert_eq!(verdict.status, SafetyStatus::Discard);
        assert_eq!(verdict.source, VerdictSource::HardDenylist);
    }

    #[tokio::test]
    async fn hard_discard_does_not_consult_the_classifier() {
        let classifier = Arc::new(FixedClassifier::new(SemanticOpinion {
            status: SafetyStatus::Pass,
            reason: String::new(),
            refined_content: None,
        }));
        let reviewer = SafetyReviewer::with_semantic(classifier.clone());
        let verdict = reviewer.review("guaranteed results for everyone").await;
        assert_eq!(verdict.status, SafetyStatus::Discard);
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn clean_text_without_classifier_passes_fail_open() {
        let reviewer = SafetyReviewer::new();
        let verdict = reviewer.review("A calm, hedged overview of options.").await;
        assert_eq!(verdict.status, SafetyStatus::Pass);
        assert_eq!(verdict.risk_score, 5);
        assert_eq!(verdict.reason, "soft check skipped");
        assert_eq!(verdict.source, VerdictSource::SemanticSkipped);
    }

    #[tokio::test]
    async fn classifier_failure_fails_open() {
        let reviewer = SafetyReviewer::with_semantic(Arc::new(FailingClassifier));
        let verdict = reviewer.review("A calm, hedged overview of options.").await;
        assert_eq!(verdict.status, SafetyStatus::Pass);
        assert_eq!(verdict.reason, "soft check skipped");
        assert_eq!(verdict.source, VerdictSource::SemanticSkipped);
    }

    #[tokio::test]
    async fn semantic_edit_maps_to_risk_55() {
        let classifier = Arc::new(FixedClassifier::new(SemanticOpinion {
            status: SafetyStatus::Edit,
            reason: "tone implies certainty".to_string(),
            refined_content: Some("a softened rewrite".to_string()),
        }));
        let reviewer = SafetyReviewer::with_semantic(classifier.clone());
        let verdict = reviewer.review("A calm, hedged overview of options.").await;
        assert_eq!(verdict.status, SafetyStatus::Edit);
        assert_eq!(verdict.risk_score, 55);
        assert_eq!(verdict.reason, "tone implies certainty");
        assert_eq!(verdict.refined_content.as_deref(), Some("a softened rewrite"));
        assert_eq!(verdict.source, VerdictSource::Semantic);
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn semantic_discard_maps_to_risk_85() {
        let reviewer = SafetyReviewer::with_semantic(Arc::new(FixedClassifier::new(
            SemanticOpinion {
                status: SafetyStatus::Discard,
                reason: "reads as representation".to_string(),
                refined_content: None,
            },
        )));
        let verdict = reviewer.review("A calm, hedged overview of options.").await;
        assert_eq!(verdict.status, SafetyStatus::Discard);
        assert_eq!(verdict.risk_score, 85);
    }

    #[tokio::test]
    async fn semantic_pass_maps_to_risk_5_and_drops_refined_text() {
        let reviewer = SafetyReviewer::with_semantic(Arc::new(FixedClassifier::new(
            SemanticOpinion {
                status: SafetyStatus::Pass,
                reason: String::new(),
                refined_content: Some("should be ignored".to_string()),
            },
        )));
        let verdict = reviewer.review("A calm, hedged overview of options.").await;
        assert_eq!(verdict.status, SafetyStatus::Pass);
        assert_eq!(verdict.risk_score, 5);
        assert_eq!(verdict.reason, "semantic pass");
        assert!(verdict.refined_content.is_none());
        assert_eq!(verdict.source, VerdictSource::Semantic);
    }
}
