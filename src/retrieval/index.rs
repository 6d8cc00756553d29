use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::EngineError;

use super::tokens::{cosine_similarity, TokenBag};

#[derive(Debug, Clone)]
struct IndexedSegment {
    text: String,
    bag: TokenBag,
}

/// In-memory retrieval store: key -> ordered segments with cached bags.
///
/// Keys are speaker names or date labels. Segment order under a key is
/// insertion order, and entries are never mutated in place: `put` replaces
/// the whole list for a key and recomputes every bag. Accumulation across
/// documents is the caller's job (read `segments`, concatenate, `put`).
#[derive(Debug, Default)]
pub struct SegmentIndex {
    entries: HashMap<String, Vec<IndexedSegment>>,
}

impl SegmentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the key's full segment list.
    pub fn put(&mut self, key: &str, segments: Vec<String>) {
        let indexed = segments
            .into_iter()
            .map(|text| {
                let bag = TokenBag::from_text(&text);
                IndexedSegment { text, bag }
            })
            .collect();
        self.entries.insert(key.to_string(), indexed);
    }

    /// Stored segment texts for a key, empty when the key is absent.
    pub fn segments(&self, key: &str) -> Vec<&str> {
        self.entries
            .get(key)
            .map(|segments| segments.iter().map(|s| s.text.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rank the key's segments against a query by cosine similarity.
    ///
    /// Descending by score; the sort is stable, so equally scored segments
    /// keep their insertion order. Returns at most `top_k` texts (all of
    /// them when the key holds fewer). Callers are expected to check
    /// `contains` first; an unknown key is reported, not panicked on.
    pub fn query(
        &self,
        key: &str,
        query_text: &str,
        top_k: usize,
    ) -> Result<Vec<String>, EngineError> {
        let segments = self
            .entries
            .get(key)
            .ok_or_else(|| EngineError::KeyNotFound(key.to_string()))?;

        let query_bag = TokenBag::from_text(query_text);
        let mut scored: Vec<(f64, &IndexedSegment)> = segments
            .iter()
            .map(|segment| (cosine_similarity(&query_bag, &segment.bag), segment))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(_, segment)| segment.text.clone())
            .collect())
    }

    /// Drop every key and its cached bags.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_ranks_by_token_overlap() {
        let mut index = SegmentIndex::new();
        index.put("A", vec!["x y".to_string(), "y y y".to_string()]);

        let top = index.query("A", "y", 1).unwrap();
        assert_eq!(top, vec!["y y y"]);
    }

    #[test]
    fn test_query_zero_scores_keep_insertion_order() {
        let mut index = SegmentIndex::new();
        index.put("A", vec!["x y".to_string(), "y y y".to_string()]);

        let all = index.query("A", "z", 5).unwrap();
        assert_eq!(all, vec!["x y", "y y y"]);
    }

    #[test]
    fn test_query_returns_fewer_than_top_k() {
        let mut index = SegmentIndex::new();
        index.put("A", vec!["vienas".to_string()]);

        let results = index.query("A", "vienas", 3).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_query_unknown_key() {
        let index = SegmentIndex::new();
        let err = index.query("nobody", "klausimas", 3).unwrap_err();
        assert_eq!(err, EngineError::KeyNotFound("nobody".to_string()));
    }

    #[test]
    fn test_put_replaces_existing_segments() {
        let mut index = SegmentIndex::new();
        index.put("A", vec!["senas".to_string()]);
        index.put("A", vec!["naujas".to_string()]);

        assert_eq!(index.segments("A"), vec!["naujas"]);
    }

    #[test]
    fn test_clear_removes_all_keys() {
        let mut index = SegmentIndex::new();
        index.put("A", vec!["tekstas".to_string()]);
        index.clear();

        assert!(!index.contains("A"));
        assert!(index.is_empty());
    }
}
