//! Case record - the immutable input to the production loop.

use crate::id::CaseId;
use crate::Time;
use serde::{Deserialize, Serialize};

/// A case describes one planned landing document.
///
/// Cases are owned by the case store; the production loop reads them and
/// only ever writes back a terminal status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
    /// Unique identifier
    pub case_id: CaseId,

    /// Slug of the rendered artifact, unique across all documents
    pub slug: Option<String>,

    /// Domain category (e.g. "debt", "test")
    pub category: Option<String>,

    /// Page title seed
    pub title: Option<String>,

    /// Headline seed
    pub headline: Option<String>,

    /// Who the document is written for
    pub target_user: Option<String>,

    /// Pain point summary seed
    pub pain_summary: Option<String>,

    /// Intro copy seed
    pub intro_copy: Option<String>,

    /// Comma-separated auxiliary keywords
    pub keywords: Option<String>,

    /// FAQ seed pairs
    #[serde(default)]
    pub faq: Vec<FaqPair>,

    /// Lifecycle status
    pub status: CaseStatus,

    /// Batch date tag (set by whoever schedules the case)
    pub batch_date: Option<String>,

    /// Reader intent ("calculation", "action", "exploration")
    pub user_intent: Option<String>,

    /// Relationship category between the parties (e.g. "b2b", "c2c")
    pub relationship: Option<String>,

    /// Legal strategy hint
    pub legal_strategy: Option<String>,

    /// Claim amount band
    pub amount_band: Option<String>,

    /// Structural layout type ("type_a", "type_b", "type_c")
    pub structure_type: Option<String>,

    /// Unique data point the document should feature
    pub unique_data_point: Option<String>,

    /// Primary keyword
    pub main_keyword: Option<String>,

    /// Creation timestamp
    pub created_at: Time,

    /// Last update timestamp
    pub updated_at: Time,
}

impl Case {
    /// Create a minimal case with the given id and slug, everything else unset.
    pub fn new(case_id: impl Into<CaseId>, slug: impl Into<String>) -> Self {
        let now = chrono::Utc::now();
        Self {
            case_id: case_id.into(),
            slug: Some(slug.into()),
            category: None,
            title: None,
            headline: None,
            target_user: None,
            pain_summary: None,
            intro_copy: None,
            keywords: None,
            faq: Vec::new(),
            status: CaseStatus::Todo,
            batch_date: None,
            user_intent: None,
            relationship: None,
            legal_strategy: None,
            amount_band: None,
            structure_type: None,
            unique_data_point: None,
            main_keyword: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this case should bypass the live generator.
    ///
    /// Designated test cases get a fixed, denylist-free document instead of
    /// an external generation call.
    pub fn is_safe_mode(&self) -> bool {
        self.case_id.as_str() == "TEST-CASE-001"
            || self.category.as_deref() == Some("test")
    }
}

/// One FAQ seed pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqPair {
    /// Question text
    pub question: String,

    /// Answer text
    pub answer: String,
}

/// Case lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    /// Waiting to be processed
    Todo,
    /// Picked up by a production loop
    Drafting,
    /// Rendered and persisted
    Published,
    /// Terminally rejected
    Discarded,
}

impl CaseStatus {
    /// Stable string form used by the case store.
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Todo => "todo",
            CaseStatus::Drafting => "drafting",
            CaseStatus::Published => "published",
            CaseStatus::Discarded => "discarded",
        }
    }

    /// Parse a stored status string; unknown values fall back to Todo.
    pub fn parse(s: &str) -> Self {
        match s {
            "drafting" => CaseStatus::Drafting,
            "published" => CaseStatus::Published,
            "discarded" => CaseStatus::Discarded,
            _ => CaseStatus::Todo,
        }
    }
}

impl std::fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only projection of a case's planning metadata.
///
/// Threaded through every evaluation call so evaluators get context
/// without seeing the full case record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanningInfo {
    /// Reader intent
    pub user_intent: Option<String>,

    /// Structural layout type
    pub structure_type: Option<String>,

    /// Relationship category
    pub relationship: Option<String>,

    /// Legal strategy hint
    pub legal_strategy: Option<String>,

    /// Unique data point hint
    pub unique_data_point: Option<String>,

    /// Primary keyword
    pub main_keyword: Option<String>,

    /// Comma-separated auxiliary keywords
    pub keywords: Option<String>,
}

impl PlanningInfo {
    /// Project the planning fields out of a case.
    pub fn from_case(case: &Case) -> Self {
        Self {
            user_intent: case.user_intent.clone(),
            structure_type: case.structure_type.clone(),
            relationship: case.relationship.clone(),
            legal_strategy: case.legal_strategy.clone(),
            unique_data_point: case.unique_data_point.clone(),
            main_keyword: case.main_keyword.clone(),
            keywords: case.keywords.clone(),
        }
    }
}
