//! # feedback-store
//!
//! AI 回答反馈的收集、持久化与汇总统计库。
//!
//! Collection and aggregation store for user ratings of AI-generated
//! responses.
//!
//! ## Overview
//!
//! Each rateable response ("interaction") gets an opaque id. Callers ask the
//! store whether that id already has feedback and, if not, submit one rating
//! event for it. The store keeps a per-process working copy of all records,
//! writes the full collection to a single JSON file after every change
//! (keeping a backup of the previous version), and recomputes summary
//! statistics from scratch.
//!
//! ## Key Features
//!
//! - **At-most-once submission**: a second submission for an id is reported
//!   as [`SubmitOutcome::Duplicate`] and changes nothing
//! - **Fail-open persistence**: unreadable files load as empty, failed writes
//!   keep the record in memory and are logged with path and error
//! - **Atomic replace**: writes go to a temp file renamed over the data file
//! - **Statistics**: average, rating distribution, satisfaction rate, recent
//!   records, and trend flags via [`stats`]
//! - **CSV export** with one column per rating dimension
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use feedback_store::{FeedbackConfig, FeedbackStore, FeedbackSubmission, RatingDimension};
//!
//! let mut store = FeedbackStore::new(FeedbackConfig::from_env()?)?;
//! let id = store.generate_interaction_id();
//!
//! let outcome = store.submit(
//!     &id,
//!     FeedbackSubmission::default()
//!         .with_rating(RatingDimension::Accuracy, 5)
//!         .with_rating(RatingDimension::Clarity, 4)
//!         .with_comment("讲解清楚"),
//! )?;
//! if !outcome.is_persisted() {
//!     eprintln!("saved for this session only");
//! }
//!
//! if let Some(report) = store.analyze_trends() {
//!     for area in &report.improvement_areas {
//!         println!("{}", area);
//!     }
//! }
//! # Ok::<(), feedback_store::Error>(())
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`feedback`] | Record and submission types, id generation |
//! | [`store`] | Store façade, session cache, file persistence |
//! | [`stats`] | Summary statistics and trend analysis |
//! | [`export`] | CSV export |
//! | [`config`] | Paths, session id, thresholds; env and YAML loading |

pub mod config;
pub mod export;
pub mod feedback;
pub mod stats;
pub mod store;

pub use config::FeedbackConfig;
pub use feedback::{
    generate_interaction_id, FeedbackRecord, FeedbackSubmission, RatingDimension,
};
pub use stats::{FeedbackStats, ImprovementArea, TrendReport, TrendThresholds};
pub use store::{FeedbackStore, FilePersistence, SessionCache, SubmitOutcome};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
