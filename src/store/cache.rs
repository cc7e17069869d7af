//! In-process working copy of the collection.

use super::persistence::FilePersistence;
use crate::FeedbackRecord;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Lazily loaded mirror of the feedback file with an id index.
///
/// Only [`FeedbackStore`](super::FeedbackStore) mutates it.
#[derive(Debug, Default)]
pub struct SessionCache {
    records: Vec<FeedbackRecord>,
    ids: HashSet<String>,
    initialized: bool,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Loads from disk on first call, merging file records the cache does
    /// not hold yet. Later calls do nothing. Returns whether a load happened.
    pub fn ensure_initialized(&mut self, persistence: &FilePersistence) -> bool {
        if self.initialized {
            return false;
        }
        let added = self.merge(persistence.load());
        self.initialized = true;
        debug!(added, total = self.records.len(), "feedback cache initialized");
        true
    }

    /// Replaces the cache with the file contents. Records that exist only in
    /// this session (never persisted) are dropped.
    pub fn force_refresh(&mut self, persistence: &FilePersistence) {
        let previous = std::mem::take(&mut self.ids);
        self.records.clear();
        self.merge(persistence.load());
        self.initialized = true;

        let dropped = previous.iter().filter(|id| !self.ids.contains(*id)).count();
        if dropped > 0 {
            warn!(dropped, path = %persistence.path().display(), "refresh dropped session-only feedback");
        }
        debug!(total = self.records.len(), "feedback cache refreshed");
    }

    pub fn contains(&self, interaction_id: &str) -> bool {
        self.ids.contains(interaction_id)
    }

    /// Appends unless the id is already present.
    pub fn push(&mut self, record: FeedbackRecord) -> bool {
        if !self.ids.insert(record.interaction_id.clone()) {
            return false;
        }
        self.records.push(record);
        true
    }

    pub fn get(&self, interaction_id: &str) -> Option<&FeedbackRecord> {
        if !self.contains(interaction_id) {
            return None;
        }
        self.records
            .iter()
            .find(|r| r.interaction_id == interaction_id)
    }

    pub fn records(&self) -> &[FeedbackRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Empties the cache; it stays initialized.
    pub fn clear(&mut self) {
        self.records.clear();
        self.ids.clear();
        self.initialized = true;
    }

    fn merge(&mut self, incoming: Vec<FeedbackRecord>) -> usize {
        let before = self.records.len();
        for record in incoming {
            self.push(record);
        }
        self.records.len() - before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FeedbackSubmission;

    fn record(id: &str) -> FeedbackRecord {
        FeedbackSubmission::overall(4).into_record(id, "s")
    }

    #[test]
    fn test_push_rejects_duplicates() {
        let mut cache = SessionCache::new();
        assert!(cache.push(record("a")));
        assert!(!cache.push(record("a")));
        assert_eq!(cache.len(), 1);
        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
    }

    #[test]
    fn test_initialize_merges_once() {
        let dir = tempfile::tempdir().unwrap();
        let p = FilePersistence::new(dir.path().join("fb.json"));
        assert!(p.save(&[record("disk")]));

        let mut cache = SessionCache::new();
        cache.push(record("local"));
        assert!(!cache.is_initialized());
        assert!(cache.ensure_initialized(&p));
        assert!(cache.is_initialized());
        assert_eq!(cache.len(), 2);
        assert!(cache.contains("disk"));

        assert!(p.save(&[record("disk"), record("other")]));
        assert!(!cache.ensure_initialized(&p));
        assert!(!cache.contains("other"));
    }

    #[test]
    fn test_refresh_prefers_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = FilePersistence::new(dir.path().join("fb.json"));
        assert!(p.save(&[record("x")]));

        let mut cache = SessionCache::new();
        cache.ensure_initialized(&p);
        cache.push(record("unsaved"));

        cache.force_refresh(&p);
        let first: Vec<_> = cache.records().to_vec();
        cache.force_refresh(&p);
        assert_eq!(cache.records(), first.as_slice());
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].interaction_id, "x");
        assert!(!cache.contains("unsaved"));
    }
}
