//! Per-page analysis cache
//!
//! Keyed by page index, which stays stable for the session even though the
//! page's resource handle may be revoked and recreated. Entries are never
//! evicted: one small result per visited page is kept for the session.

use std::collections::HashMap;
use std::sync::Arc;

use super::types::AnalysisResult;

#[derive(Debug, Default)]
pub struct AnalysisCache {
    results: HashMap<usize, Arc<AnalysisResult>>,
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, page: usize) -> Option<Arc<AnalysisResult>> {
        self.results.get(&page).cloned()
    }

    pub fn contains(&self, page: usize) -> bool {
        self.results.contains_key(&page)
    }

    /// Store a result; an existing entry for the page is kept
    pub fn insert(&mut self, page: usize, result: Arc<AnalysisResult>) -> Arc<AnalysisResult> {
        Arc::clone(self.results.entry(page).or_insert(result))
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn clear(&mut self) {
        self.results.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panels::NormalizedBox;

    #[test]
    fn test_insert_keeps_first_result() {
        let mut cache = AnalysisCache::new();
        let first = Arc::new(AnalysisResult::fallback(100, 200));
        let mut other = AnalysisResult::fallback(100, 200);
        other.crop_box = NormalizedBox::new(0.1, 0.1, 0.5, 0.5);

        cache.insert(4, Arc::clone(&first));
        let kept = cache.insert(4, Arc::new(other));

        assert!(Arc::ptr_eq(&kept, &first));
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(4));
        assert!(cache.get(5).is_none());
    }
}
