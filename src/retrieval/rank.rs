use std::cmp::Ordering;

use super::tokens::{cosine_similarity, TokenBag};

/// Rank segments drawn from several labeled buckets as one pool.
///
/// Each text is prefixed with its originating label in brackets before
/// scoring, so the label's tokens take part in the match and the caller
/// can tell which bucket a returned segment came from. One stable
/// descending rank across the whole corpus, not per-bucket top-k.
pub fn rank_labeled(corpus: &[(String, String)], query: &str, top_k: usize) -> Vec<String> {
    let labeled: Vec<String> = corpus
        .iter()
        .map(|(label, text)| format!("[{label}] {text}"))
        .collect();

    let query_bag = TokenBag::from_text(query);
    let mut scored: Vec<(f64, &String)> = labeled
        .iter()
        .map(|text| (cosine_similarity(&query_bag, &TokenBag::from_text(text)), text))
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

    scored
        .into_iter()
        .take(top_k)
        .map(|(_, text)| text.clone())
        .collect()
}
