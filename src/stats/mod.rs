//! 反馈统计模块：从当前反馈集合重新计算汇总统计与趋势标记。
//!
//! # Feedback Statistics
//!
//! Read-only summaries over a collection of [`FeedbackRecord`](crate::FeedbackRecord)s.
//! Every value here is recomputed from the full collection; nothing is
//! adjusted incrementally, so the numbers cannot drift from the data.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`FeedbackStats`] | Counts, average, rating distribution, recent records |
//! | [`TrendReport`] | Improvement areas and dominant feedback type |
//! | [`TrendThresholds`] | Tunable cut-offs for trend flags |
//! | [`ImprovementArea`] | Typed improvement flag with its display message |
//!
//! ## Example
//!
//! ```rust
//! use feedback_store::stats::{FeedbackStats, TrendReport, TrendThresholds};
//! use feedback_store::FeedbackSubmission;
//!
//! let records = vec![
//!     FeedbackSubmission::overall(5).into_record("a", "s"),
//!     FeedbackSubmission::overall(1).into_record("b", "s"),
//!     FeedbackSubmission::overall(2).into_record("c", "s"),
//! ];
//! let stats = FeedbackStats::compute(&records, 5);
//! assert_eq!(stats.total_count, 3);
//!
//! let report = TrendReport::analyze(&records, &TrendThresholds::default()).unwrap();
//! assert_eq!(report.low_rating_count, 2);
//! ```

mod aggregate;
mod trends;

pub use aggregate::FeedbackStats;
pub use trends::{FeedbackTypeConcern, ImprovementArea, TrendReport, TrendThresholds};

use crate::FeedbackRecord;

/// Effective ratings of the records that carry one (> 0).
pub(crate) fn rated_values(records: &[FeedbackRecord]) -> Vec<f64> {
    records
        .iter()
        .map(FeedbackRecord::effective_rating)
        .filter(|r| *r > 0.0)
        .collect()
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
