//! Evaluation results keyed by layout fingerprint.

use std::collections::HashMap;

use parking_lot::Mutex;
use reactorsim_core::SimulationResults;
use tracing::debug;

#[derive(Debug)]
pub struct ResultCache {
    capacity: usize,
    entries: Mutex<HashMap<String, SimulationResults>>,
}

impl ResultCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, fingerprint: &str) -> Option<SimulationResults> {
        self.entries.lock().get(fingerprint).cloned()
    }

    /// Stores `results`, dropping everything once the cache is full.
    pub fn insert(&self, fingerprint: String, results: SimulationResults) {
        let mut entries = self.entries.lock();
        if entries.len() >= self.capacity && !entries.contains_key(&fingerprint) {
            debug!(dropped = entries.len(), "result cache full, clearing");
            entries.clear();
        }
        entries.insert(fingerprint, results);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clears_when_full() {
        let cache = ResultCache::new(2);
        cache.insert("a".into(), SimulationResults::default());
        cache.insert("b".into(), SimulationResults::default());
        cache.insert("b".into(), SimulationResults::default());
        assert_eq!(cache.len(), 2);
        cache.insert("c".into(), SimulationResults::default());
        assert_eq!(cache.len(), 1);
        assert!(cache.get("a").is_none());
        assert!(cache.get("c").is_some());
    }
}
