//! File persistence for the feedback collection.

use crate::config::FeedbackConfig;
use crate::{Error, ErrorContext, FeedbackRecord, Result};
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Reads and writes the whole collection as one JSON array.
///
/// - Before each write the current file is copied to the backup path
///   (best effort)
/// - Writes go to a temp sibling which is then renamed over the data file,
///   so readers never see a half-written array
/// - `load`/`save` never fail; errors are logged and folded into an empty
///   collection or `false`
#[derive(Debug, Clone)]
pub struct FilePersistence {
    path: PathBuf,
    backup_path: PathBuf,
    temp_path: PathBuf,
}

impl FilePersistence {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::from_config(&FeedbackConfig::new().with_data_file(path))
    }

    pub fn from_config(config: &FeedbackConfig) -> Self {
        Self {
            path: config.data_file.clone(),
            backup_path: config.backup_path(),
            temp_path: config.temp_path(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Loads the collection, or an empty one if the file is missing or bad.
    pub fn load(&self) -> Vec<FeedbackRecord> {
        match self.try_load() {
            Ok(records) => records,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read feedback file, starting empty");
                Vec::new()
            }
        }
    }

    /// Like [`load`](Self::load) but reports why the file could not be read.
    /// A missing file is not an error.
    pub fn try_load(&self) -> Result<Vec<FeedbackRecord>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no feedback file yet");
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.read_error(e.to_string())),
        };

        let value: serde_json::Value =
            serde_json::from_str(&raw).map_err(|e| self.read_error(e.to_string()))?;
        let items = match value {
            serde_json::Value::Array(items) => items,
            other => {
                return Err(self.read_error(format!(
                    "expected a JSON array, found {}",
                    json_kind(&other)
                )))
            }
        };

        let mut seen = HashSet::new();
        let mut records = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            match serde_json::from_value::<FeedbackRecord>(item) {
                Ok(record) => {
                    if seen.insert(record.interaction_id.clone()) {
                        records.push(record);
                    } else {
                        warn!(
                            path = %self.path.display(),
                            interaction_id = %record.interaction_id,
                            "duplicate feedback record in file, keeping the first"
                        );
                    }
                }
                Err(e) => {
                    warn!(path = %self.path.display(), index, error = %e, "skipping malformed feedback record");
                }
            }
        }
        debug!(path = %self.path.display(), count = records.len(), "loaded feedback file");
        Ok(records)
    }

    /// Writes the collection; returns `false` on any failure.
    pub fn save(&self, records: &[FeedbackRecord]) -> bool {
        match self.try_save(records) {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to save feedback file");
                false
            }
        }
    }

    pub fn try_save(&self, records: &[FeedbackRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.write_error(e.to_string()))?;
            }
        }

        self.backup();

        let body = serde_json::to_string_pretty(records)?;
        if let Err(e) = self.write_replace(body.as_bytes()) {
            let _ = fs::remove_file(&self.temp_path);
            return Err(self.write_error(e.to_string()));
        }
        debug!(path = %self.path.display(), count = records.len(), "saved feedback file");
        Ok(())
    }

    /// Deletes the data file. The backup stays as the last recovery point.
    pub fn remove(&self) -> bool {
        match fs::remove_file(&self.path) {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to delete feedback file");
                false
            }
        }
    }

    fn backup(&self) {
        if !self.path.exists() {
            return;
        }
        if let Err(e) = fs::copy(&self.path, &self.backup_path) {
            warn!(
                path = %self.path.display(),
                backup = %self.backup_path.display(),
                error = %e,
                "feedback backup failed, saving anyway"
            );
        }
    }

    fn write_replace(&self, bytes: &[u8]) -> std::io::Result<()> {
        let mut file = fs::File::create(&self.temp_path)?;
        file.write_all(bytes)?;
        file.write_all(b"\n")?;
        file.sync_all()?;
        drop(file);
        fs::rename(&self.temp_path, &self.path)
    }

    fn read_error(&self, details: String) -> Error {
        Error::persistence_with_context(
            "cannot read feedback file",
            ErrorContext::new()
                .with_field_path(self.path.display().to_string())
                .with_details(details)
                .with_source("persistence"),
        )
    }

    fn write_error(&self, details: String) -> Error {
        Error::persistence_with_context(
            "cannot write feedback file",
            ErrorContext::new()
                .with_field_path(self.path.display().to_string())
                .with_details(details)
                .with_source("persistence"),
        )
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FeedbackSubmission;

    fn sample(id: &str, rating: u8) -> FeedbackRecord {
        FeedbackSubmission::overall(rating)
            .with_comment("回答很清楚")
            .into_record(id, "session")
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let p = FilePersistence::new(dir.path().join("none.json"));
        assert!(p.try_load().unwrap().is_empty());
        assert!(p.load().is_empty());
    }

    #[test]
    fn test_corrupt_file_fails_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fb.json");
        fs::write(&path, "{not json").unwrap();
        let p = FilePersistence::new(&path);
        assert!(matches!(p.try_load(), Err(Error::Persistence { .. })));
        assert!(p.load().is_empty());

        fs::write(&path, r#"{"interaction_id": "x"}"#).unwrap();
        assert!(p.load().is_empty());
    }

    #[test]
    fn test_save_then_load_preserves_records() {
        let dir = tempfile::tempdir().unwrap();
        let p = FilePersistence::new(dir.path().join("nested/fb.json"));
        let records = vec![sample("a", 4), sample("b", 2)];
        assert!(p.save(&records));
        assert_eq!(p.load(), records);

        let raw = fs::read_to_string(p.path()).unwrap();
        assert!(raw.contains("回答很清楚"));
        assert!(raw.contains("\n  {"));
        assert!(!dir.path().join("nested/fb.json.tmp").exists());
    }

    #[test]
    fn test_backup_holds_previous_version() {
        let dir = tempfile::tempdir().unwrap();
        let p = FilePersistence::new(dir.path().join("fb.json"));
        assert!(p.save(&[sample("a", 4)]));
        assert!(!p.backup_path().exists());

        assert!(p.save(&[sample("a", 4), sample("b", 5)]));
        let backup: Vec<FeedbackRecord> =
            serde_json::from_str(&fs::read_to_string(p.backup_path()).unwrap()).unwrap();
        assert_eq!(backup.len(), 1);
        assert_eq!(p.load().len(), 2);
    }

    #[test]
    fn test_malformed_and_duplicate_entries_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fb.json");
        fs::write(
            &path,
            r#"[
                {"interaction_id": "x", "average_rating": 3.0},
                {"comment": "no id"},
                {"interaction_id": "x", "average_rating": 5.0},
                {"interaction_id": "y", "ratings": {"clarity": 4}}
            ]"#,
        )
        .unwrap();
        let records = FilePersistence::new(&path).load();
        let ids: Vec<_> = records.iter().map(|r| r.interaction_id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y"]);
        assert_eq!(records[0].average_rating, 3.0);
    }

    #[test]
    fn test_save_into_missing_parent_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file, not a directory").unwrap();
        let p = FilePersistence::new(blocker.join("fb.json"));
        assert!(!p.save(&[sample("a", 3)]));
        assert!(matches!(p.try_save(&[]), Err(Error::Persistence { .. })));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let p = FilePersistence::new(dir.path().join("fb.json"));
        assert!(p.save(&[sample("a", 3)]));
        assert!(p.remove());
        assert!(!p.exists());
        assert!(p.remove());
    }
}
