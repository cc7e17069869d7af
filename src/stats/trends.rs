//! Trend analysis over the collection.

use super::{mean, rated_values};
use crate::{Error, ErrorContext, FeedbackRecord, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendThresholds {
    /// Average below this flags [`ImprovementArea::LowAverageRating`].
    pub low_average: f64,
    /// A rating below this counts as low.
    pub low_rating_below: f64,
    /// Low-rating share above this flags [`ImprovementArea::HighLowRatingShare`].
    pub low_share: f64,
    /// A feedback type above this share of all records is reported.
    pub concern_share: f64,
}

impl Default for TrendThresholds {
    fn default() -> Self {
        Self {
            low_average: 3.5,
            low_rating_below: 3.0,
            low_share: 0.3,
            concern_share: 0.4,
        }
    }
}

impl TrendThresholds {
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("trend_thresholds.low_average", self.low_average, 5.0),
            ("trend_thresholds.low_rating_below", self.low_rating_below, 5.0),
            ("trend_thresholds.low_share", self.low_share, 1.0),
            ("trend_thresholds.concern_share", self.concern_share, 1.0),
        ];
        for (field, value, max) in checks {
            if !(0.0..=max).contains(&value) {
                return Err(Error::configuration_with_context(
                    format!("threshold must be within 0..={}", max),
                    ErrorContext::new()
                        .with_field_path(field)
                        .with_details(value.to_string()),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImprovementArea {
    LowAverageRating,
    HighLowRatingShare,
}

impl ImprovementArea {
    pub fn message(&self) -> &'static str {
        match self {
            ImprovementArea::LowAverageRating => "整体评分偏低，需要提升回答质量",
            ImprovementArea::HighLowRatingShare => {
                "低评分比例较高，需要重点关注用户不满意的原因"
            }
        }
    }
}

impl fmt::Display for ImprovementArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// A feedback type that dominates the collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackTypeConcern {
    pub feedback_type: String,
    pub count: usize,
    pub share: f64,
}

impl fmt::Display for FeedbackTypeConcern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "「{}」类反馈占比 {:.1}%（{} 条）",
            self.feedback_type,
            self.share * 100.0,
            self.count
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendReport {
    pub total_feedback: usize,
    pub avg_rating: f64,
    pub low_rating_count: usize,
    pub improvement_areas: Vec<ImprovementArea>,
    pub specific_concern: Option<FeedbackTypeConcern>,
}

impl TrendReport {
    /// Returns `None` for an empty collection.
    pub fn analyze(records: &[FeedbackRecord], thresholds: &TrendThresholds) -> Option<Self> {
        if records.is_empty() {
            return None;
        }
        let total = records.len();
        let ratings = rated_values(records);
        let avg_rating = mean(&ratings);
        let low_rating_count = ratings
            .iter()
            .filter(|r| **r < thresholds.low_rating_below)
            .count();

        let mut improvement_areas = Vec::new();
        if avg_rating < thresholds.low_average {
            improvement_areas.push(ImprovementArea::LowAverageRating);
        }
        if low_rating_count as f64 / total as f64 > thresholds.low_share {
            improvement_areas.push(ImprovementArea::HighLowRatingShare);
        }

        Some(Self {
            total_feedback: total,
            avg_rating,
            low_rating_count,
            improvement_areas,
            specific_concern: dominant_type(records, thresholds.concern_share),
        })
    }

    pub fn has_improvement_areas(&self) -> bool {
        !self.improvement_areas.is_empty()
    }
}

/// Most frequent feedback type if its share exceeds `min_share`; ties go to
/// the type seen first.
fn dominant_type(records: &[FeedbackRecord], min_share: f64) -> Option<FeedbackTypeConcern> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for r in records {
        let c = counts.entry(r.feedback_type.as_str()).or_insert(0);
        if *c == 0 {
            order.push(r.feedback_type.as_str());
        }
        *c += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for label in order {
        let n = counts[label];
        if best.map_or(true, |(_, m)| n > m) {
            best = Some((label, n));
        }
    }

    let (label, count) = best?;
    let share = count as f64 / records.len() as f64;
    (share > min_share).then(|| FeedbackTypeConcern {
        feedback_type: label.to_string(),
        count,
        share,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::OVERALL_FEEDBACK_TYPE;
    use crate::FeedbackSubmission;

    fn overall(id: &str, rating: u8) -> FeedbackRecord {
        FeedbackSubmission::overall(rating).into_record(id, "s")
    }

    #[test]
    fn test_empty_has_no_report() {
        assert!(TrendReport::analyze(&[], &TrendThresholds::default()).is_none());
    }

    #[test]
    fn test_low_rating_share_flagged() {
        let records = vec![overall("a", 5), overall("b", 1), overall("c", 2)];
        let report = TrendReport::analyze(&records, &TrendThresholds::default()).unwrap();
        assert_eq!(report.total_feedback, 3);
        assert!((report.avg_rating - 8.0 / 3.0).abs() < 1e-9);
        assert_eq!(report.low_rating_count, 2);
        assert!(report
            .improvement_areas
            .contains(&ImprovementArea::LowAverageRating));
        assert!(report
            .improvement_areas
            .iter()
            .any(|a| a.message().contains("低评分比例较高")));
    }

    #[test]
    fn test_healthy_collection_not_flagged() {
        let records = vec![overall("a", 5), overall("b", 4), overall("c", 4), overall("d", 2)];
        let report = TrendReport::analyze(&records, &TrendThresholds::default()).unwrap();
        assert_eq!(report.low_rating_count, 1);
        assert!(!report.has_improvement_areas());
    }

    #[test]
    fn test_dominant_feedback_type() {
        let mut records = vec![overall("a", 4), overall("b", 4)];
        records.push(
            FeedbackSubmission::dimensional([("accuracy", 4)]).into_record("c", "s"),
        );
        let report = TrendReport::analyze(&records, &TrendThresholds::default()).unwrap();
        let concern = report.specific_concern.unwrap();
        assert_eq!(concern.feedback_type, OVERALL_FEEDBACK_TYPE);
        assert_eq!(concern.count, 2);
    }

    #[test]
    fn test_even_split_has_no_concern() {
        let records = vec![
            overall("a", 4),
            FeedbackSubmission::dimensional([("accuracy", 4)]).into_record("b", "s"),
            FeedbackSubmission::overall(4)
                .with_feedback_type("paper")
                .into_record("c", "s"),
        ];
        let report = TrendReport::analyze(&records, &TrendThresholds::default()).unwrap();
        assert!(report.specific_concern.is_none());
    }
}
