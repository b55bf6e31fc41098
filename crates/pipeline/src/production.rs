//! The retry state machine.

use caseforge_core::{
    Attempt, Case, CaseId, CaseOutcome, CaseStatus, ContentDocument, PlanningInfo,
    ProductionState,
};
use caseforge_metrics::{MetricsSink, OutcomeRecord};
use caseforge_quality::{count_unique_blocks, max_similarity, pui_score, uniqueness};
use caseforge_render::Renderer;
use caseforge_safety::SafetyReviewer;
use caseforge_storage::CaseStore;
use caseforge_writer::{Writer, WriterMode};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;

/// Hard ceiling on attempts per case.
///
/// Requests for a larger budget are clamped here. The asymmetry between
/// the `max_attempts` parameter and this ceiling is inherited behavior:
/// it bounds external-service cost per case, and raising it changes the
/// cost/quality tradeoff.
pub const ATTEMPT_CAP: u32 = 2;

/// Minimum acceptable uniqueness score.
const MIN_UNIQUENESS: f64 = 0.6;
/// Minimum acceptable unique block count.
const MIN_UNIQUE_BLOCKS: usize = 3;

/// Drives one case through draft, gating, and terminal persistence.
pub struct ProductionLoop {
    store: Arc<dyn CaseStore>,
    writer: Arc<dyn Writer>,
    reviewer: SafetyReviewer,
    renderer: Arc<dyn Renderer>,
    metrics: Arc<dyn MetricsSink>,
    config: PipelineConfig,
}

impl ProductionLoop {
    /// Wire up a loop over its collaborators.
    pub fn new(
        store: Arc<dyn CaseStore>,
        writer: Arc<dyn Writer>,
        reviewer: SafetyReviewer,
        renderer: Arc<dyn Renderer>,
        metrics: Arc<dyn MetricsSink>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            writer,
            reviewer,
            renderer,
            metrics,
            config,
        }
    }

    /// Run the production loop for one case.
    ///
    /// Always returns a terminal outcome; every failure mode is folded
    /// into the retry/discard decision rather than escaping as a fault.
    pub async fn run(&self, case_id: &CaseId, max_attempts: u32) -> CaseOutcome {
        let case = match self.store.get_case(case_id).await {
            Ok(Some(case)) => case,
            Ok(None) => {
                warn!(%case_id, "case not found");
                return CaseOutcome::error("case_not_found");
            }
            Err(e) => {
                warn!(%case_id, "case lookup failed: {e}");
                return CaseOutcome::error(format!("store_error: {e}"));
            }
        };

        let mode = if case.is_safe_mode() {
            WriterMode::SafeTest
        } else {
            WriterMode::Live
        };
        let planning = PlanningInfo::from_case(&case);
        let effective = max_attempts.min(ATTEMPT_CAP);

        let mut attempt = Attempt::first();
        while attempt.number <= effective {
            let is_last = attempt.number >= effective;

            debug!(%case_id, attempt = attempt.number, state = ?ProductionState::Drafting);
            let document = if attempt.is_first() {
                self.writer.generate(&case, &planning, mode).await
            } else {
                self.writer
                    .refine(
                        &case,
                        attempt.previous_text.as_deref().unwrap_or_default(),
                        attempt.feedback.as_deref().unwrap_or_default(),
                        &planning,
                        mode,
                    )
                    .await
            };

            let Some(mut document) = document else {
                if is_last {
                    return self.discard(&case, &planning, &attempt, "writer_failed").await;
                }
                attempt = attempt.retry("writer_failed", None);
                continue;
            };

            if let Some(slug) = case.slug.as_deref() {
                document.inject_slug(slug);
            }
            document.inherit_structure_type(&planning);

            let flattened = document.flatten();
            attempt.word_count = Some(flattened.split_whitespace().count());

            debug!(%case_id, attempt = attempt.number, state = ?ProductionState::SafetyCheck);
            let verdict = self.reviewer.review(&flattened).await;
            attempt.safety_status = Some(verdict.status);
            if verdict.is_blocking() {
                let reason = verdict.reason.clone();
                if is_last {
                    return self.discard(&case, &planning, &attempt, &reason).await;
                }
                info!(
                    %case_id,
                    attempt = attempt.number,
                    status = %verdict.status,
                    "safety blocked, trying a self-rewrite: {reason}"
                );
                let candidate = verdict.refined_content.unwrap_or(flattened);
                attempt = attempt.retry(reason, Some(candidate));
                continue;
            }

            debug!(%case_id, attempt = attempt.number, state = ?ProductionState::QualityCheck);
            let corpus = match self.store.list_recent_accepted(self.config.corpus_limit).await {
                Ok(corpus) => corpus,
                Err(e) => {
                    warn!(%case_id, "corpus unavailable, comparing against nothing: {e}");
                    Vec::new()
                }
            };
            let similarity = max_similarity(&flattened, &corpus);
            let uniq = uniqueness(similarity);
            let blocks = count_unique_blocks(&flattened, &planning);
            attempt.similarity = Some(similarity);
            attempt.uniqueness = Some(uniq);
            attempt.unique_blocks = Some(blocks);

            let too_similar = similarity > self.config.similarity_threshold;
            let not_unique = uniq < MIN_UNIQUENESS || blocks < MIN_UNIQUE_BLOCKS;
            if too_similar || not_unique {
                let mut parts = Vec::new();
                if too_similar {
                    parts.push(format!(
                        "similarity {similarity:.2} > {:.2}",
                        self.config.similarity_threshold
                    ));
                }
                if not_unique {
                    parts.push(format!(
                        "uniqueness {uniq:.2} / unique blocks {blocks} (required: {MIN_UNIQUENESS}+, {MIN_UNIQUE_BLOCKS}+)"
                    ));
                }
                let reason = format!(
                    "{} -> diversify structure, wording, and examples.",
                    parts.join(" / ")
                );
                if is_last {
                    return self.discard(&case, &planning, &attempt, &reason).await;
                }
                info!(%case_id, attempt = attempt.number, "similarity gate failed: {reason}");
                attempt = attempt.retry(reason, Some(flattened));
                continue;
            }

            let pui = pui_score(&flattened, &planning, Some(&verdict));
            attempt.pui = Some(pui);
            info!(
                %case_id,
                total = pui.total,
                structure = pui.structure,
                data = pui.data,
                eeat = pui.eeat,
                "PUI computed"
            );
            if pui.total < self.config.min_pui_score {
                let reason = format!(
                    "pui {} < required {}; strengthen structure, data, and EEAT signals.",
                    pui.total, self.config.min_pui_score
                );
                if is_last {
                    return self.discard(&case, &planning, &attempt, &reason).await;
                }
                info!(%case_id, attempt = attempt.number, "PUI gate failed: {reason}");
                attempt = attempt.retry(reason, Some(flattened));
                continue;
            }

            debug!(%case_id, attempt = attempt.number, state = ?ProductionState::Publishing);
            match self.publish(&case, &planning, &attempt, &document).await {
                Ok(artifact_path) => {
                    if let Some(scores) = attempt.quality_scores() {
                        debug!(
                            %case_id,
                            similarity = scores.similarity,
                            uniqueness = scores.uniqueness,
                            unique_blocks = scores.unique_blocks,
                            pui = scores.pui.total,
                            "final score card"
                        );
                    }
                    info!(%case_id, attempt = attempt.number, artifact = %artifact_path, "case published");
                    return CaseOutcome::published(artifact_path, attempt.number);
                }
                Err(e) => {
                    let reason = format!("render_error: {e}");
                    warn!(%case_id, attempt = attempt.number, "{reason}");
                    if is_last {
                        return self.discard(&case, &planning, &attempt, &reason).await;
                    }
                    attempt = attempt.retry(reason, Some(flattened));
                    continue;
                }
            }
        }

        // Unreachable when effective >= 1: every failure above either
        // retries or discards. Kept so a zero-attempt budget still
        // terminates the case.
        let reason = attempt
            .feedback
            .clone()
            .unwrap_or_else(|| "max_attempts_exceeded".to_string());
        let outcome = self.discard(&case, &planning, &attempt, &reason).await;
        CaseOutcome {
            attempts: effective,
            ..outcome
        }
    }

    /// Render, persist, and log a publishable document.
    async fn publish(
        &self,
        case: &Case,
        planning: &PlanningInfo,
        attempt: &Attempt,
        document: &ContentDocument,
    ) -> anyhow::Result<String> {
        let artifact_path = self.renderer.render(document).await?;
        self.store
            .set_status(&case.case_id, CaseStatus::Published)
            .await?;

        let slug = document
            .slug()
            .map(str::to_string)
            .or_else(|| case.slug.clone())
            .unwrap_or_default();
        self.metrics
            .record(&self.outcome_record(case, planning, attempt, slug, None))
            .await?;
        Ok(artifact_path)
    }

    /// Persist and log a terminal discard.
    ///
    /// Persistence problems here are logged and swallowed; the caller
    /// still gets its outcome.
    async fn discard(
        &self,
        case: &Case,
        planning: &PlanningInfo,
        attempt: &Attempt,
        reason: &str,
    ) -> CaseOutcome {
        debug!(case_id = %case.case_id, state = ?ProductionState::Discarded);
        if let Err(e) = self
            .store
            .set_status(&case.case_id, CaseStatus::Discarded)
            .await
        {
            warn!(case_id = %case.case_id, "failed to persist discarded status: {e}");
        }

        let slug = case.slug.clone().unwrap_or_default();
        let record = self.outcome_record(case, planning, attempt, slug, Some(reason.to_string()));
        if let Err(e) = self.metrics.record(&record).await {
            warn!(case_id = %case.case_id, "failed to log outcome: {e}");
        }

        CaseOutcome::discarded(reason, attempt.number)
    }

    fn outcome_record(
        &self,
        case: &Case,
        planning: &PlanningInfo,
        attempt: &Attempt,
        slug: String,
        reason: Option<String>,
    ) -> OutcomeRecord {
        OutcomeRecord {
            case_id: case.case_id.to_string(),
            slug,
            status: if reason.is_some() {
                caseforge_core::OutcomeStatus::Discarded
            } else {
                caseforge_core::OutcomeStatus::Published
            },
            reason,
            safety_status: attempt.safety_status,
            similarity: attempt.similarity,
            uniqueness: attempt.uniqueness,
            unique_blocks: attempt.unique_blocks,
            word_count: attempt.word_count,
            pui: attempt.pui,
            user_intent: planning.user_intent.clone(),
            structure_type: planning.structure_type.clone(),
            domain_type: case
                .category
                .clone()
                .unwrap_or_else(|| "debt".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use caseforge_core::{OutcomeStatus, SafetyStatus};
    use caseforge_render::RenderError;
    use caseforge_storage::Result as StoreResult;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct MockStore {
        case: Option<Case>,
        corpus: Vec<String>,
        get_calls: AtomicUsize,
        statuses: Mutex<Vec<CaseStatus>>,
    }

    impl MockStore {
        fn with_case(case: Case) -> Self {
            Self {
                case: Some(case),
                corpus: Vec::new(),
                get_calls: AtomicUsize::new(0),
                statuses: Mutex::new(Vec::new()),
            }
        }

        fn empty() -> Self {
            Self {
                case: None,
                corpus: Vec::new(),
                get_calls: AtomicUsize::new(0),
                statuses: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CaseStore for MockStore {
        async fn get_case(&self, id: &CaseId) -> StoreResult<Option<Case>> {
            self.get_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.case.clone().filter(|c| &c.case_id == id))
        }

        async fn upsert_case(&self, _case: &Case) -> StoreResult<()> {
            Ok(())
        }

        async fn set_status(&self, _id: &CaseId, status: CaseStatus) -> StoreResult<()> {
            self.statuses.lock().unwrap().push(status);
            Ok(())
        }

        async fn list_todo(&self, _limit: usize) -> StoreResult<Vec<Case>> {
            Ok(Vec::new())
        }

        async fn list_recent_accepted(&self, _limit: usize) -> StoreResult<Vec<String>> {
            Ok(self.corpus.clone())
        }

        async fn cleanup_null_cases(&self) -> StoreResult<u64> {
            Ok(0)
        }

        async fn count_published(&self) -> StoreResult<u64> {
            Ok(0)
        }
    }

    struct ScriptedWriter {
        documents: Mutex<VecDeque<ContentDocument>>,
        generate_calls: AtomicUsize,
        refine_calls: AtomicUsize,
        feedbacks: Mutex<Vec<String>>,
        modes: Mutex<Vec<WriterMode>>,
    }

    impl ScriptedWriter {
        fn with_documents(documents: Vec<ContentDocument>) -> Self {
            Self {
                documents: Mutex::new(documents.into()),
                generate_calls: AtomicUsize::new(0),
                refine_calls: AtomicUsize::new(0),
                feedbacks: Mutex::new(Vec::new()),
                modes: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self::with_documents(Vec::new())
        }

        fn next(&self) -> Option<ContentDocument> {
            self.documents.lock().unwrap().pop_front()
        }
    }

    #[async_trait]
    impl Writer for ScriptedWriter {
        async fn generate(
            &self,
            _case: &Case,
            _planning: &PlanningInfo,
            mode: WriterMode,
        ) -> Option<ContentDocument> {
            self.generate_calls.fetch_add(1, Ordering::SeqCst);
            self.modes.lock().unwrap().push(mode);
            self.next()
        }

        async fn refine(
            &self,
            _case: &Case,
            _previous_text: &str,
            feedback: &str,
            _planning: &PlanningInfo,
            mode: WriterMode,
        ) -> Option<ContentDocument> {
            self.refine_calls.fetch_add(1, Ordering::SeqCst);
            self.feedbacks.lock().unwrap().push(feedback.to_string());
            self.modes.lock().unwrap().push(mode);
            self.next()
        }
    }

    struct MockRenderer {
        fail_first: usize,
        calls: AtomicUsize,
    }

    impl MockRenderer {
        fn new() -> Self {
            Self {
                fail_first: 0,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing_once() -> Self {
            Self {
                fail_first: 1,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Renderer for MockRenderer {
        async fn render(&self, document: &ContentDocument) -> Result<String, RenderError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                return Err(RenderError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "disk full",
                )));
            }
            let slug = document.slug().ok_or(RenderError::MissingSlug)?;
            Ok(format!("public/{slug}.html"))
        }
    }

    struct RecordingSink {
        rows: Mutex<Vec<OutcomeRecord>>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                rows: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl MetricsSink for RecordingSink {
        async fn record(
            &self,
            record: &OutcomeRecord,
        ) -> Result<(), caseforge_metrics::MetricsError> {
            self.rows.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    fn planned_case(id: &str) -> Case {
        let mut case = Case::new(id, "unpaid-invoice-playbook");
        case.category = Some("debt".to_string());
        case.user_intent = Some("calculation".to_string());
        case.structure_type = Some("type_a".to_string());
        case.legal_strategy = Some("payment order".to_string());
        case.unique_data_point = Some("3 business days".to_string());
        case.main_keyword = Some("unpaid invoice".to_string());
        case.keywords = Some("freelancer, invoice".to_string());
        case
    }

    /// A document that clears safety, similarity (against an empty
    /// corpus), uniqueness, block count, and a PUI floor of 60.
    fn good_document() -> ContentDocument {
        ContentDocument::new(json!({
            "page_meta": {
                "title": "Unpaid invoice playbook",
                "description": "What a freelancer can do about an overdue bill",
                "keywords": "freelancer, invoice",
            },
            "hero_section": {
                "headline": "TL;DR summary for the unpaid invoice",
                "intro_copy": "The figures 120, 45, 14, 250, 37, 90 and 2024 frame the claim at a 5% interest rate.",
            },
            "action_guide": {
                "guidance": "A payment order filed within 3 business days keeps the unpaid invoice moving.\n\nMost freelancer contracts settle once a payment order lands.\n\nConsult a professional before escalating an unpaid invoice.",
            },
        }))
    }

    fn soft_blocked_document() -> ContentDocument {
        ContentDocument::new(json!({
            "hero_section": {
                "headline": "You will always collect in the end",
            },
        }))
    }

    fn hard_blocked_document() -> ContentDocument {
        ContentDocument::new(json!({
            "hero_section": {
                "headline": "Payment is guaranteed with this route",
            },
        }))
    }

    struct Fixture {
        store: Arc<MockStore>,
        writer: Arc<ScriptedWriter>,
        renderer: Arc<MockRenderer>,
        sink: Arc<RecordingSink>,
        pipeline: ProductionLoop,
    }

    fn fixture(
        store: MockStore,
        writer: ScriptedWriter,
        renderer: MockRenderer,
        config: PipelineConfig,
    ) -> Fixture {
        let store = Arc::new(store);
        let writer = Arc::new(writer);
        let renderer = Arc::new(renderer);
        let sink = Arc::new(RecordingSink::new());
        let pipeline = ProductionLoop::new(
            store.clone(),
            writer.clone(),
            SafetyReviewer::new(),
            renderer.clone(),
            sink.clone(),
            config,
        );
        Fixture {
            store,
            writer,
            renderer,
            sink,
            pipeline,
        }
    }

    fn relaxed_pui() -> PipelineConfig {
        PipelineConfig {
            min_pui_score: 60,
            ..PipelineConfig::default()
        }
    }

    #[tokio::test]
    async fn unknown_case_errors_without_touching_collaborators() {
        let f = fixture(
            MockStore::empty(),
            ScriptedWriter::failing(),
            MockRenderer::new(),
            PipelineConfig::default(),
        );
        let outcome = f.pipeline.run(&CaseId::from("UNKNOWN-ID"), 3).await;

        assert_eq!(outcome.status, OutcomeStatus::Error);
        assert_eq!(outcome.reason.as_deref(), Some("case_not_found"));
        assert_eq!(f.writer.generate_calls.load(Ordering::SeqCst), 0);
        assert_eq!(f.renderer.calls.load(Ordering::SeqCst), 0);
        assert!(f.store.statuses.lock().unwrap().is_empty());
        assert!(f.sink.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn clean_document_publishes_on_first_attempt() {
        let case = planned_case("CASE-OK");
        let f = fixture(
            MockStore::with_case(case),
            ScriptedWriter::with_documents(vec![good_document()]),
            MockRenderer::new(),
            relaxed_pui(),
        );
        let outcome = f.pipeline.run(&CaseId::from("CASE-OK"), 3).await;

        assert_eq!(outcome.status, OutcomeStatus::Published);
        assert_eq!(outcome.attempts, 1);
        let artifact = outcome.artifact_path.unwrap();
        assert!(artifact.ends_with("unpaid-invoice-playbook.html"));

        assert_eq!(
            *f.store.statuses.lock().unwrap(),
            vec![CaseStatus::Published]
        );
        let rows = f.sink.rows.lock().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, OutcomeStatus::Published);
        assert!(rows[0].reason.is_none());
        assert_eq!(rows[0].safety_status, Some(SafetyStatus::Pass));
        assert_eq!(rows[0].similarity, Some(0.0));
        assert_eq!(rows[0].uniqueness, Some(1.0));
        assert!(rows[0].unique_blocks.unwrap() >= 3);
        assert!(rows[0].pui.unwrap().total >= 60);
    }

    #[tokio::test]
    async fn always_similar_generator_stops_at_the_attempt_cap() {
        let case = planned_case("CASE-SIM");
        let mut store = MockStore::with_case(case);
        // The corpus member matches the draft after slug injection, so the
        // token multisets are identical and similarity is exactly 1.0.
        let mut published = good_document();
        published.inject_slug("unpaid-invoice-playbook");
        store.corpus = vec![published.flatten()];
        let f = fixture(
            store,
            ScriptedWriter::with_documents(vec![good_document(), good_document()]),
            MockRenderer::new(),
            relaxed_pui(),
        );
        let outcome = f.pipeline.run(&CaseId::from("CASE-SIM"), 3).await;

        assert_eq!(outcome.status, OutcomeStatus::Discarded);
        assert_eq!(outcome.attempts, 2);
        assert_eq!(f.writer.generate_calls.load(Ordering::SeqCst), 1);
        assert_eq!(f.writer.refine_calls.load(Ordering::SeqCst), 1);

        let reason = outcome.reason.unwrap();
        assert!(reason.contains("similarity 1.00 > 0.40"), "reason: {reason}");
        assert!(reason.contains("diversify structure"));
        assert_eq!(
            *f.store.statuses.lock().unwrap(),
            vec![CaseStatus::Discarded]
        );
    }

    #[tokio::test]
    async fn similarity_feedback_reaches_the_refine_call() {
        let case = planned_case("CASE-FB");
        let mut store = MockStore::with_case(case);
        let mut published = good_document();
        published.inject_slug("unpaid-invoice-playbook");
        store.corpus = vec![published.flatten()];
        let f = fixture(
            store,
            ScriptedWriter::with_documents(vec![good_document(), good_document()]),
            MockRenderer::new(),
            relaxed_pui(),
        );
        f.pipeline.run(&CaseId::from("CASE-FB"), 3).await;

        let feedbacks = f.writer.feedbacks.lock().unwrap();
        assert_eq!(feedbacks.len(), 1);
        assert!(feedbacks[0].contains("similarity"));
    }

    #[tokio::test]
    async fn soft_safety_block_retries_then_publishes() {
        let case = planned_case("CASE-EDIT");
        let f = fixture(
            MockStore::with_case(case),
            ScriptedWriter::with_documents(vec![soft_blocked_document(), good_document()]),
            MockRenderer::new(),
            relaxed_pui(),
        );
        let outcome = f.pipeline.run(&CaseId::from("CASE-EDIT"), 3).await;

        assert_eq!(outcome.status, OutcomeStatus::Published);
        assert_eq!(outcome.attempts, 2);
        let feedbacks = f.writer.feedbacks.lock().unwrap();
        assert_eq!(feedbacks.len(), 1);
        assert!(feedbacks[0].contains("absolute or guarantee tone detected"));
        assert!(feedbacks[0].contains("always"));
    }

    #[tokio::test]
    async fn hard_blocked_documents_discard_with_the_match_reason() {
        let case = planned_case("CASE-HARD");
        let f = fixture(
            MockStore::with_case(case),
            ScriptedWriter::with_documents(vec![
                hard_blocked_document(),
                hard_blocked_document(),
            ]),
            MockRenderer::new(),
            relaxed_pui(),
        );
        let outcome = f.pipeline.run(&CaseId::from("CASE-HARD"), 2).await;

        assert_eq!(outcome.status, OutcomeStatus::Discarded);
        let reason = outcome.reason.unwrap();
        assert!(reason.contains("banned phrase detected"));
        assert!(reason.contains("guaranteed"));
        assert_eq!(f.renderer.calls.load(Ordering::SeqCst), 0);

        let rows = f.sink.rows.lock().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].safety_status, Some(SafetyStatus::Discard));
        // Quality never ran, so its metrics are absent rather than zero.
        assert!(rows[0].similarity.is_none());
        assert!(rows[0].pui.is_none());
    }

    #[tokio::test]
    async fn generator_failure_discards_as_writer_failed() {
        let case = planned_case("CASE-NOWRITER");
        let f = fixture(
            MockStore::with_case(case),
            ScriptedWriter::failing(),
            MockRenderer::new(),
            PipelineConfig::default(),
        );
        let outcome = f.pipeline.run(&CaseId::from("CASE-NOWRITER"), 3).await;

        assert_eq!(outcome.status, OutcomeStatus::Discarded);
        assert_eq!(outcome.reason.as_deref(), Some("writer_failed"));
        assert_eq!(outcome.attempts, 2);

        let rows = f.sink.rows.lock().unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].safety_status.is_none());
        assert!(rows[0].word_count.is_none());
    }

    #[tokio::test]
    async fn low_pui_discards_with_the_observed_total() {
        let case = planned_case("CASE-PUI");
        let f = fixture(
            MockStore::with_case(case),
            ScriptedWriter::with_documents(vec![good_document()]),
            MockRenderer::new(),
            PipelineConfig::default(),
        );
        let outcome = f.pipeline.run(&CaseId::from("CASE-PUI"), 1).await;

        assert_eq!(outcome.status, OutcomeStatus::Discarded);
        assert_eq!(outcome.attempts, 1);
        let reason = outcome.reason.unwrap();
        assert!(reason.contains("< required 80"), "reason: {reason}");
        assert!(reason.contains("strengthen structure"));
    }

    #[tokio::test]
    async fn render_failure_consumes_an_attempt_then_recovers() {
        let case = planned_case("CASE-RENDER");
        let f = fixture(
            MockStore::with_case(case),
            ScriptedWriter::with_documents(vec![good_document(), good_document()]),
            MockRenderer::failing_once(),
            relaxed_pui(),
        );
        let outcome = f.pipeline.run(&CaseId::from("CASE-RENDER"), 3).await;

        assert_eq!(outcome.status, OutcomeStatus::Published);
        assert_eq!(outcome.attempts, 2);
        // The failed render left no premature status write behind.
        assert_eq!(
            *f.store.statuses.lock().unwrap(),
            vec![CaseStatus::Published]
        );
        let feedbacks = f.writer.feedbacks.lock().unwrap();
        assert!(feedbacks[0].starts_with("render_error:"));
    }

    #[tokio::test]
    async fn requested_budget_above_the_cap_is_clamped() {
        let case = planned_case("CASE-CAP");
        let f = fixture(
            MockStore::with_case(case),
            ScriptedWriter::failing(),
            MockRenderer::new(),
            PipelineConfig::default(),
        );
        let outcome = f.pipeline.run(&CaseId::from("CASE-CAP"), 5).await;

        assert_eq!(outcome.attempts, ATTEMPT_CAP);
        let total_calls = f.writer.generate_calls.load(Ordering::SeqCst)
            + f.writer.refine_calls.load(Ordering::SeqCst);
        assert_eq!(total_calls, ATTEMPT_CAP as usize);
    }

    #[tokio::test]
    async fn single_attempt_budget_is_respected() {
        let case = planned_case("CASE-ONE");
        let f = fixture(
            MockStore::with_case(case),
            ScriptedWriter::failing(),
            MockRenderer::new(),
            PipelineConfig::default(),
        );
        let outcome = f.pipeline.run(&CaseId::from("CASE-ONE"), 1).await;

        assert_eq!(outcome.attempts, 1);
        assert_eq!(f.writer.generate_calls.load(Ordering::SeqCst), 1);
        assert_eq!(f.writer.refine_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn zero_attempt_budget_still_terminates_the_case() {
        let case = planned_case("CASE-ZERO");
        let f = fixture(
            MockStore::with_case(case),
            ScriptedWriter::failing(),
            MockRenderer::new(),
            PipelineConfig::default(),
        );
        let outcome = f.pipeline.run(&CaseId::from("CASE-ZERO"), 0).await;

        assert_eq!(outcome.status, OutcomeStatus::Discarded);
        assert_eq!(outcome.reason.as_deref(), Some("max_attempts_exceeded"));
        assert_eq!(outcome.attempts, 0);
        assert_eq!(f.writer.generate_calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            *f.store.statuses.lock().unwrap(),
            vec![CaseStatus::Discarded]
        );
    }

    #[tokio::test]
    async fn safe_mode_case_requests_the_safe_writer_path() {
        let mut case = planned_case("TEST-CASE-001");
        case.category = Some("test".to_string());
        let f = fixture(
            MockStore::with_case(case),
            ScriptedWriter::with_documents(vec![good_document()]),
            MockRenderer::new(),
            relaxed_pui(),
        );
        f.pipeline.run(&CaseId::from("TEST-CASE-001"), 1).await;

        assert_eq!(
            *f.writer.modes.lock().unwrap(),
            vec![WriterMode::SafeTest]
        );
    }

    #[tokio::test]
    async fn live_case_requests_the_live_writer_path() {
        let case = planned_case("CASE-LIVE");
        let f = fixture(
            MockStore::with_case(case),
            ScriptedWriter::with_documents(vec![good_document()]),
            MockRenderer::new(),
            relaxed_pui(),
        );
        f.pipeline.run(&CaseId::from("CASE-LIVE"), 1).await;

        assert_eq!(*f.writer.modes.lock().unwrap(), vec![WriterMode::Live]);
    }

    #[tokio::test]
    async fn slug_is_injected_from_the_case_before_rendering() {
        let case = planned_case("CASE-SLUG");
        // good_document() carries no slug of its own.
        let f = fixture(
            MockStore::with_case(case),
            ScriptedWriter::with_documents(vec![good_document()]),
            MockRenderer::new(),
            relaxed_pui(),
        );
        let outcome = f.pipeline.run(&CaseId::from("CASE-SLUG"), 1).await;

        assert_eq!(outcome.status, OutcomeStatus::Published);
        assert_eq!(
            outcome.artifact_path.as_deref(),
            Some("public/unpaid-invoice-playbook.html")
        );
        let rows = f.sink.rows.lock().unwrap();
        assert_eq!(rows[0].slug, "unpaid-invoice-playbook");
    }
}
