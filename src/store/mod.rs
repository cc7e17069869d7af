//! 反馈存储模块：提交、去重、持久化与统计的统一入口。
//!
//! # Feedback Store
//!
//! [`FeedbackStore`] is the only way to mutate the feedback collection. It
//! owns a [`SessionCache`] (the working copy), a [`FilePersistence`] (the
//! JSON file plus its backup) and the [`FeedbackStats`] recomputed after
//! every change.
//!
//! ## Lifecycle per interaction
//!
//! An interaction id moves from *not submitted* to *submitted* on the first
//! accepted [`submit`](FeedbackStore::submit) and never back. Later
//! submissions for the same id return [`SubmitOutcome::Duplicate`] and leave
//! the collection untouched.
//!
//! ## Failure model
//!
//! - Invalid ratings are rejected with [`Error::Validation`](crate::Error::Validation)
//! - A failed file write keeps the record in memory and reports
//!   `persisted: false`
//! - An unreadable file is treated as an empty collection
//!
//! The store does no locking. Concurrent writers to the same file race and
//! the last save wins.
//!
//! ## Example
//!
//! ```rust,no_run
//! use feedback_store::{FeedbackConfig, FeedbackStore, FeedbackSubmission};
//!
//! let mut store = FeedbackStore::new(FeedbackConfig::new().with_data_file("feedback.json"))?;
//! let id = store.generate_interaction_id();
//! if !store.is_submitted(&id) {
//!     let outcome = store.submit(
//!         &id,
//!         FeedbackSubmission::dimensional([("accuracy", 5), ("helpfulness", 3)]),
//!     )?;
//!     assert!(outcome.is_accepted());
//! }
//! println!("average: {:.1}", store.stats().average_rating);
//! # Ok::<(), feedback_store::Error>(())
//! ```

mod cache;
mod persistence;

pub use cache::SessionCache;
pub use persistence::FilePersistence;

use crate::config::FeedbackConfig;
use crate::export;
use crate::feedback::{self, FeedbackRecord, FeedbackSubmission};
use crate::stats::{FeedbackStats, TrendReport, TrendThresholds};
use crate::{Error, ErrorContext, Result};
use tracing::{debug, info, warn};

/// Result of a submission that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Recorded in the session; `persisted` tells whether the file write worked.
    Accepted { persisted: bool },
    /// The interaction already has feedback; nothing changed.
    Duplicate,
}

impl SubmitOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmitOutcome::Accepted { .. })
    }

    pub fn is_persisted(&self) -> bool {
        matches!(self, SubmitOutcome::Accepted { persisted: true })
    }
}

pub struct FeedbackStore {
    persistence: FilePersistence,
    cache: SessionCache,
    stats: FeedbackStats,
    session_id: String,
    recent_limit: usize,
    thresholds: TrendThresholds,
}

impl FeedbackStore {
    /// Creates a store; the file is read on first use. The config is
    /// validated first, so a backup path equal to the data file is rejected.
    pub fn new(config: FeedbackConfig) -> Result<Self> {
        config.validate()?;
        let session_id = config
            .session_id
            .clone()
            .unwrap_or_else(feedback::generate_interaction_id);
        Ok(Self {
            persistence: FilePersistence::from_config(&config),
            cache: SessionCache::new(),
            stats: FeedbackStats::default(),
            session_id,
            recent_limit: config.recent_limit,
            thresholds: config.trend_thresholds,
        })
    }

    /// Store over `path` with default settings, loaded immediately.
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let mut store = Self::new(FeedbackConfig::new().with_data_file(path))?;
        store.ensure_initialized();
        Ok(store)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn persistence(&self) -> &FilePersistence {
        &self.persistence
    }

    pub fn ensure_initialized(&mut self) {
        if self.cache.ensure_initialized(&self.persistence) {
            self.recompute_stats();
        }
    }

    /// Reloads from the file, dropping session-only records.
    pub fn force_refresh(&mut self) {
        self.cache.force_refresh(&self.persistence);
        self.recompute_stats();
    }

    pub fn is_submitted(&mut self, interaction_id: &str) -> bool {
        self.ensure_initialized();
        self.cache.contains(interaction_id)
    }

    pub fn submit(
        &mut self,
        interaction_id: &str,
        submission: FeedbackSubmission,
    ) -> Result<SubmitOutcome> {
        if interaction_id.trim().is_empty() {
            return Err(Error::validation_with_context(
                "interaction id must not be empty",
                ErrorContext::new()
                    .with_field_path("interaction_id")
                    .with_source("submission"),
            ));
        }
        submission.validate()?;
        self.ensure_initialized();

        if self.cache.contains(interaction_id) {
            info!(interaction_id, "feedback already submitted");
            return Ok(SubmitOutcome::Duplicate);
        }

        let record = submission.into_record(interaction_id, self.session_id.as_str());
        let average = record.average_rating;
        self.cache.push(record);

        let persisted = self.persistence.save(self.cache.records());
        if !persisted {
            warn!(
                interaction_id,
                path = %self.persistence.path().display(),
                "feedback kept in session only, file write failed"
            );
        }
        self.recompute_stats();
        debug!(interaction_id, average, persisted, "feedback submitted");
        Ok(SubmitOutcome::Accepted { persisted })
    }

    /// Drops every record and deletes the data file. Returns whether the
    /// file removal succeeded.
    pub fn clear(&mut self) -> bool {
        let count = self.cache.len();
        self.cache.clear();
        self.recompute_stats();
        let removed = self.persistence.remove();
        info!(count, removed, path = %self.persistence.path().display(), "feedback cleared");
        removed
    }

    pub fn get(&mut self, interaction_id: &str) -> Option<&FeedbackRecord> {
        self.ensure_initialized();
        self.cache.get(interaction_id)
    }

    pub fn records(&mut self) -> &[FeedbackRecord] {
        self.ensure_initialized();
        self.cache.records()
    }

    pub fn len(&mut self) -> usize {
        self.ensure_initialized();
        self.cache.len()
    }

    pub fn is_empty(&mut self) -> bool {
        self.len() == 0
    }

    pub fn stats(&mut self) -> &FeedbackStats {
        self.ensure_initialized();
        &self.stats
    }

    pub fn analyze_trends(&mut self) -> Option<TrendReport> {
        self.ensure_initialized();
        TrendReport::analyze(self.cache.records(), &self.thresholds)
    }

    /// CSV text of the collection; empty string when there is nothing to export.
    pub fn export_csv(&mut self) -> String {
        self.ensure_initialized();
        export::to_csv(self.cache.records())
    }

    pub fn generate_interaction_id(&self) -> String {
        feedback::generate_interaction_id()
    }

    fn recompute_stats(&mut self) {
        self.stats = FeedbackStats::compute(self.cache.records(), self.recent_limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> FeedbackStore {
        FeedbackStore::new(
            FeedbackConfig::new()
                .with_data_file(dir.path().join("fb.json"))
                .with_session_id("test-session"),
        )
        .unwrap()
    }

    #[test]
    fn test_submit_then_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        assert!(!store.is_submitted("a1"));

        let outcome = store
            .submit(
                "a1",
                FeedbackSubmission::dimensional([("accuracy", 5), ("helpfulness", 3)]),
            )
            .unwrap();
        assert_eq!(outcome, SubmitOutcome::Accepted { persisted: true });
        assert!(store.is_submitted("a1"));
        assert_eq!(store.get("a1").unwrap().average_rating, 4.0);
        assert_eq!(store.get("a1").unwrap().session_id, "test-session");

        let again = store.submit("a1", FeedbackSubmission::overall(1)).unwrap();
        assert_eq!(again, SubmitOutcome::Duplicate);
        assert!(!again.is_accepted());
        assert_eq!(store.len(), 1);
        assert_eq!(store.stats().average_rating, 4.0);
    }

    #[test]
    fn test_invalid_submission_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        assert!(store.submit("a", FeedbackSubmission::overall(6)).is_err());
        assert!(store.submit("a", FeedbackSubmission::overall(0)).is_err());
        assert!(store.submit("  ", FeedbackSubmission::overall(3)).is_err());
        assert!(!store.is_submitted("a"));
        assert!(!store.persistence().exists());
    }

    #[test]
    fn test_stats_follow_submissions() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        for (id, r) in [("a", 5), ("b", 1), ("c", 2)] {
            store.submit(id, FeedbackSubmission::overall(r)).unwrap();
        }
        let stats = store.stats();
        assert_eq!(stats.total_count, 3);
        assert!((stats.average_rating - 8.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.recent.len(), 3);
    }

    #[test]
    fn test_clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        store.submit("a", FeedbackSubmission::overall(4)).unwrap();
        assert!(store.persistence().exists());

        assert!(store.clear());
        assert!(!store.persistence().exists());
        assert!(store.is_empty());
        assert!(store.stats().is_empty());
        assert!(!store.is_submitted("a"));
        assert_eq!(store.export_csv(), "");
    }

    #[test]
    fn test_generated_session_id() {
        let dir = tempfile::tempdir().unwrap();
        let store =
            FeedbackStore::new(FeedbackConfig::new().with_data_file(dir.path().join("x.json")))
                .unwrap();
        assert!(!store.session_id().is_empty());
    }

    #[test]
    fn test_backup_equal_to_data_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fb.json");
        std::fs::write(&path, r#"[{"interaction_id": "keep", "average_rating": 4.0}]"#).unwrap();

        let res = FeedbackStore::new(
            FeedbackConfig::new()
                .with_data_file(&path)
                .with_backup_file(&path),
        );
        assert!(matches!(res, Err(Error::Configuration { .. })));
        assert_eq!(FilePersistence::new(&path).load().len(), 1);
    }
}
