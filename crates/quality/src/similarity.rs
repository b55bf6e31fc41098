//! Term-frequency cosine similarity against the accepted corpus.

use std::collections::HashMap;

/// Tokenize text by splitting on non-word-character runs and lowercasing.
/// Empty tokens are discarded.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Build a term-frequency vector for a text.
fn term_frequencies(text: &str) -> HashMap<String, f64> {
    let mut counts = HashMap::new();
    for token in tokenize(text) {
        *counts.entry(token).or_insert(0.0) += 1.0;
    }
    counts
}

/// Cosine similarity between two term-frequency vectors.
///
/// Returns 0.0 when either vector is empty or has zero norm.
fn cosine(a: &HashMap<String, f64>, b: &HashMap<String, f64>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let dot: f64 = a
        .iter()
        .map(|(term, freq)| freq * b.get(term).copied().unwrap_or(0.0))
        .sum();
    let norm_a = a.values().map(|v| v * v).sum::<f64>().sqrt();
    let norm_b = b.values().map(|v| v * v).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Maximum pairwise cosine similarity between `text` and each corpus
/// member. An empty corpus scores 0.0.
pub fn max_similarity(text: &str, corpus: &[String]) -> f64 {
    let draft = term_frequencies(text);
    let mut max_sim: f64 = 0.0;
    for member in corpus {
        let sim = cosine(&draft, &term_frequencies(member));
        if sim > max_sim {
            max_sim = sim;
        }
    }
    max_sim
}
