//! Summary statistics.

use super::{mean, rated_values};
use crate::feedback::{MAX_SCORE, MIN_SCORE};
use crate::FeedbackRecord;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeedbackStats {
    pub total_count: usize,
    /// Mean of the rated records; 0 when none are rated.
    pub average_rating: f64,
    /// Rounded rating (1..=5) -> number of records.
    pub rating_distribution: BTreeMap<u8, usize>,
    /// Percentage of all records rated 4 or 5 after rounding.
    pub satisfaction_rate: f64,
    /// Most recent records first.
    pub recent: Vec<FeedbackRecord>,
}

impl FeedbackStats {
    pub fn compute(records: &[FeedbackRecord], recent_limit: usize) -> Self {
        let ratings = rated_values(records);

        let mut rating_distribution = BTreeMap::new();
        for r in &ratings {
            *rating_distribution.entry(bucket(*r)).or_insert(0) += 1;
        }

        let satisfied: usize = rating_distribution
            .iter()
            .filter(|(k, _)| **k >= 4)
            .map(|(_, v)| *v)
            .sum();
        let satisfaction_rate = if records.is_empty() {
            0.0
        } else {
            satisfied as f64 / records.len() as f64 * 100.0
        };

        Self {
            total_count: records.len(),
            average_rating: mean(&ratings),
            rating_distribution,
            satisfaction_rate,
            recent: most_recent(records, recent_limit),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }

    pub fn count_for(&self, rating: u8) -> usize {
        self.rating_distribution.get(&rating).copied().unwrap_or(0)
    }

    /// Share of all records falling in `rating`, as a percentage.
    pub fn percentage_for(&self, rating: u8) -> f64 {
        if self.total_count == 0 {
            0.0
        } else {
            self.count_for(rating) as f64 / self.total_count as f64 * 100.0
        }
    }
}

/// Nearest integer with ties to even (2.5 -> 2, 3.5 -> 4), clamped to 1..=5.
fn bucket(rating: f64) -> u8 {
    let floor = rating.floor();
    let frac = rating - floor;
    let rounded = if frac > 0.5 || (frac == 0.5 && floor % 2.0 != 0.0) {
        floor + 1.0
    } else {
        floor
    };
    rounded.clamp(f64::from(MIN_SCORE), f64::from(MAX_SCORE)) as u8
}

/// Sorted by parsed timestamp, newest first; records whose timestamp does
/// not parse go last. The sort is stable so ties keep insertion order.
fn most_recent(records: &[FeedbackRecord], limit: usize) -> Vec<FeedbackRecord> {
    let mut keyed: Vec<_> = records
        .iter()
        .map(|r| (r.parsed_timestamp(), r))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    keyed
        .into_iter()
        .take(limit)
        .map(|(_, r)| r.clone())
        .collect()
}
