//! Uniqueness, unique-block, and PUI rubric scoring.

use caseforge_core::{PlanningInfo, PuiScore, SafetyStatus, SafetyVerdict};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Cap on the structure sub-score.
const STRUCTURE_CAP: u32 = 40;
/// Cap on the data sub-score.
const DATA_CAP: u32 = 35;
/// Cap on the EEAT sub-score.
const EEAT_CAP: u32 = 25;
/// Cap on the numeric-token contribution inside the data sub-score.
const NUMERIC_POINTS_CAP: u32 = 15;

/// Phrases that disqualify the EEAT no-overclaim bonus.
const OVERCLAIM_WORDS: [&str; 3] = ["unconditional", "100%", "guaranteed win"];

fn paragraph_split() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\s*\n").unwrap())
}

fn numeric_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d[\d,\.]*").unwrap())
}

/// Uniqueness as the complement of similarity.
///
/// Out-of-range similarity values are clamped first, so the result is
/// always in [0, 1].
pub fn uniqueness(similarity: f64) -> f64 {
    1.0 - similarity.clamp(0.0, 1.0)
}

/// Count paragraphs that mention at least one planning keyword.
///
/// Paragraphs are blank-line separated; keywords come from the planning
/// fields plus the comma-split auxiliary keyword list. Matching is
/// case-insensitive substring containment.
pub fn count_unique_blocks(text: &str, planning: &PlanningInfo) -> usize {
    let mut keywords: Vec<String> = Vec::new();
    for value in [
        planning.main_keyword.as_deref(),
        planning.unique_data_point.as_deref(),
        planning.legal_strategy.as_deref(),
        planning.relationship.as_deref(),
        planning.user_intent.as_deref(),
        planning.structure_type.as_deref(),
    ]
    .into_iter()
    .flatten()
    {
        keywords.push(value.to_string());
    }
    if let Some(aux) = planning.keywords.as_deref() {
        keywords.extend(aux.split(',').map(str::to_string));
    }

    let keywords: Vec<String> = keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();
    if keywords.is_empty() {
        return 0;
    }

    paragraph_split()
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .filter(|p| {
            let lowered = p.to_lowercase();
            keywords.iter().any(|k| lowered.contains(k))
        })
        .count()
}

/// Compute the PUI rubric for a document.
///
/// Pure over its inputs; the thresholds here are load-bearing and changing
/// them changes what the production loop will publish.
pub fn pui_score(
    text: &str,
    planning: &PlanningInfo,
    safety: Option<&SafetyVerdict>,
) -> PuiScore {
    let text_lower = text.to_lowercase();
    let intent = planning
        .user_intent
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();
    let structure_type = planning
        .structure_type
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();

    let structure = structure_points(&text_lower, &intent, &structure_type);
    let data = data_points(text, &text_lower, planning);
    let eeat = eeat_points(&text_lower, safety);

    PuiScore {
        total: (structure + data + eeat).min(100),
        structure,
        data,
        eeat,
    }
}

fn structure_points(text_lower: &str, intent: &str, structure_type: &str) -> u32 {
    let mut score = 0;

    if intent == "calculation" && text_lower.contains("tl;dr") {
        score += 10;
    }
    if intent == "action"
        && (text_lower.contains("step") || text_lower.contains("1.") || text_lower.contains("2."))
    {
        score += 10;
    }
    if intent == "exploration"
        && (text_lower.contains("case study") || text_lower.contains("story"))
    {
        score += 8;
    }

    if structure_type == "type_a"
        && (text_lower.contains("summary") || text_lower.contains("tl;dr"))
    {
        score += 6;
    }
    if structure_type == "type_b"
        && (text_lower.contains("case study") || text_lower.contains("story"))
    {
        score += 6;
    }
    if structure_type == "type_c"
        && (text_lower.contains("faq") || text_lower.contains("checklist"))
    {
        score += 6;
    }

    score.min(STRUCTURE_CAP)
}

fn data_points(text: &str, text_lower: &str, planning: &PlanningInfo) -> u32 {
    let mut score = 0;

    let distinct_numbers: HashSet<&str> = numeric_token()
        .find_iter(text)
        .map(|m| m.as_str())
        .collect();
    score += (distinct_numbers.len() as u32 * 2).min(NUMERIC_POINTS_CAP);

    if let Some(unique_point) = planning.unique_data_point.as_deref() {
        if !unique_point.is_empty() && text_lower.contains(&unique_point.to_lowercase()) {
            score += 8;
        }
    }
    if let Some(strategy) = planning.legal_strategy.as_deref() {
        if !strategy.is_empty() && text_lower.contains(&strategy.to_lowercase()) {
            score += 6;
        }
    }
    if text.contains('%') || text_lower.contains("interest rate") {
        score += 4;
    }

    score.min(DATA_CAP)
}

fn eeat_points(text_lower: &str, safety: Option<&SafetyVerdict>) -> u32 {
    let mut score = 0;

    if text_lower.contains("not legal advice") {
        score += 6;
    }
    if text_lower.contains("consult a professional") || text_lower.contains("consult an expert") {
        score += 6;
    }
    if safety.map(|v| v.status) == Some(SafetyStatus::Pass) {
        score += 6;
    }
    if !OVERCLAIM_WORDS.iter().any(|w| text_lower.contains(w)) {
        score += 4;
    }

    score.min(EEAT_CAP)
}
