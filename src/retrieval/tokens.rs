use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref WORD_RE: Regex = Regex::new(r"\w+").unwrap();
}

/// Split text into lowercase word tokens.
///
/// Runs of non-word characters are separators; Unicode word characters
/// (including diacritic letters) are kept intact.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    WORD_RE
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Word-frequency bag over the lowercase tokens of one segment.
///
/// Computed once when a segment enters an index and never mutated after.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenBag {
    counts: HashMap<String, u32>,
}

impl TokenBag {
    pub fn from_text(text: &str) -> Self {
        let mut counts = HashMap::new();
        for token in tokenize(text) {
            *counts.entry(token).or_insert(0) += 1;
        }
        Self { counts }
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn count(&self, token: &str) -> u32 {
        self.counts.get(token).copied().unwrap_or(0)
    }

    fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counts.iter().map(|(t, &c)| (t.as_str(), c))
    }

    fn norm(&self) -> f64 {
        self.counts
            .values()
            .map(|&c| (c as f64) * (c as f64))
            .sum::<f64>()
            .sqrt()
    }
}

/// Cosine similarity between two token bags, in [0, 1].
///
/// Returns exactly 0.0 when either bag is empty, so a zero norm never
/// divides.
pub fn cosine_similarity(a: &TokenBag, b: &TokenBag) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small
        .iter()
        .map(|(token, count)| (count as f64) * (large.count(token) as f64))
        .sum();

    let norm_a = a.norm();
    let norm_b = b.norm();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_lowercases_and_keeps_diacritics() {
        let tokens = tokenize("Café, CAFÉ!");
        assert_eq!(tokens, vec!["café", "café"]);
    }

    #[test]
    fn test_tokenize_drops_punctuation() {
        let tokens = tokenize("Sveiki -- visi; (dar) kartą.");
        assert_eq!(tokens, vec!["sveiki", "visi", "dar", "kartą"]);
        for token in &tokens {
            assert!(token.chars().all(|c| c.is_alphanumeric() || c == '_'));
        }
    }

    #[test]
    fn test_cosine_identical_bag_is_one() {
        let bag = TokenBag::from_text("vienas du du trys");
        let score = cosine_similarity(&bag, &bag);
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_is_symmetric() {
        let a = TokenBag::from_text("posėdis prasideda dabar");
        let b = TokenBag::from_text("dabar kalba pirmininkas");
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    }

    #[test]
    fn test_cosine_empty_bag_is_zero() {
        let empty = TokenBag::from_text("");
        let full = TokenBag::from_text("žodis");
        assert_eq!(cosine_similarity(&empty, &full), 0.0);
        assert_eq!(cosine_similarity(&full, &empty), 0.0);
        assert_eq!(cosine_similarity(&empty, &empty), 0.0);
    }

    #[test]
    fn test_cosine_disjoint_bags_are_zero() {
        let a = TokenBag::from_text("vienas du");
        let b = TokenBag::from_text("trys keturi");
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }
}
