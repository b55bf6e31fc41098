//! Seed data for local operation and tests.

use caseforge_core::{Case, FaqPair};

/// The designated safe-mode test case.
///
/// Its id and category both mark it as safe mode, so running it never
/// touches the live generator.
pub fn test_case() -> Case {
    let mut case = Case::new("TEST-CASE-001", "test-freelancer-unpaid");
    case.category = Some("test".to_string());
    case.title = Some("Freelancer unpaid invoice test case".to_string());
    case.headline = Some("Test freelancer unpaid invoice".to_string());
    case.target_user = Some("test user".to_string());
    case.pain_summary = Some("test pain point".to_string());
    case.intro_copy = Some("This is a test intro line.".to_string());
    case.keywords = Some("test, freelancer, unpaid".to_string());
    case.user_intent = Some("calculation".to_string());
    case.structure_type = Some("type_a".to_string());
    case.legal_strategy = Some("payment order".to_string());
    case.unique_data_point = Some("3 business days".to_string());
    case.main_keyword = Some("unpaid invoice".to_string());
    case.faq = vec![
        FaqPair {
            question: "Test FAQ 1?".to_string(),
            answer: "Test answer 1".to_string(),
        },
        FaqPair {
            question: "Test FAQ 2?".to_string(),
            answer: "Test answer 2".to_string(),
        },
        FaqPair {
            question: "Test FAQ 3?".to_string(),
            answer: "Test answer 3".to_string(),
        },
    ];
    case
}
