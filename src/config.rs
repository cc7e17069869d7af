//! Store configuration
//!
//! Defaults match the layout older producers wrote: a `feedback_data/`
//! directory under the working directory holding `feedback_data.json`.

use crate::stats::TrendThresholds;
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_DATA_FILE: &str = "FEEDBACK_DATA_FILE";
pub const ENV_BACKUP_FILE: &str = "FEEDBACK_BACKUP_FILE";
pub const ENV_SESSION_ID: &str = "FEEDBACK_SESSION_ID";
pub const ENV_RECENT_LIMIT: &str = "FEEDBACK_RECENT_LIMIT";

pub const DEFAULT_DATA_FILE: &str = "feedback_data/feedback_data.json";
pub const DEFAULT_RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    pub data_file: PathBuf,
    /// Overrides the `<data_file>.backup` sibling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_file: Option<PathBuf>,
    /// Fixed session id; a random one is generated per store when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub recent_limit: usize,
    pub trend_thresholds: TrendThresholds,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            backup_file: None,
            session_id: None,
            recent_limit: DEFAULT_RECENT_LIMIT,
            trend_thresholds: TrendThresholds::default(),
        }
    }
}

impl FeedbackConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data_file(mut self, path: impl AsRef<Path>) -> Self {
        self.data_file = path.as_ref().to_path_buf();
        self
    }

    pub fn with_backup_file(mut self, path: impl AsRef<Path>) -> Self {
        self.backup_file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = Some(id.into());
        self
    }

    pub fn with_recent_limit(mut self, limit: usize) -> Self {
        self.recent_limit = limit;
        self
    }

    pub fn with_trend_thresholds(mut self, thresholds: TrendThresholds) -> Self {
        self.trend_thresholds = thresholds;
        self
    }

    /// Defaults overlaid with `FEEDBACK_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();
        if let Ok(path) = std::env::var(ENV_DATA_FILE) {
            cfg.data_file = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var(ENV_BACKUP_FILE) {
            cfg.backup_file = Some(PathBuf::from(path));
        }
        if let Ok(id) = std::env::var(ENV_SESSION_ID) {
            cfg.session_id = Some(id);
        }
        if let Ok(raw) = std::env::var(ENV_RECENT_LIMIT) {
            cfg.recent_limit = raw.trim().parse().map_err(|e| {
                Error::configuration_with_context(
                    format!("invalid {}: {}", ENV_RECENT_LIMIT, e),
                    ErrorContext::new()
                        .with_field_path("recent_limit")
                        .with_details(raw.clone())
                        .with_source("env"),
                )
            })?;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let cfg: Self = serde_yaml::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.data_file.as_os_str().is_empty() {
            return Err(Error::configuration_with_context(
                "data file path must not be empty",
                ErrorContext::new().with_field_path("data_file"),
            ));
        }
        if self.backup_file.as_deref() == Some(self.data_file.as_path()) {
            return Err(Error::configuration_with_context(
                "backup file must differ from the data file",
                ErrorContext::new()
                    .with_field_path("backup_file")
                    .with_details(self.data_file.display().to_string()),
            ));
        }
        self.trend_thresholds.validate()
    }

    pub fn backup_path(&self) -> PathBuf {
        match &self.backup_file {
            Some(p) => p.clone(),
            None => sibling_with_suffix(&self.data_file, "backup"),
        }
    }

    pub fn temp_path(&self) -> PathBuf {
        sibling_with_suffix(&self.data_file, "tmp")
    }
}

/// `dir/name.json` -> `dir/name.json.<suffix>`
fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}
