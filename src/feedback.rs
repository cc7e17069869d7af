//! 反馈记录类型：单条评分事件及其提交输入。
//!
//! Core feedback types.
//!
//! [`FeedbackRecord`] is the persisted value object (one rating event for one
//! interaction). [`FeedbackSubmission`] is what callers hand to the store; it
//! is validated and turned into a record exactly once.

use crate::{Error, ErrorContext, Result};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label for records produced by the multi-dimension rating flow.
pub const DIMENSIONAL_FEEDBACK_TYPE: &str = "多维度评分";
/// Label for records produced by the single overall rating flow.
pub const OVERALL_FEEDBACK_TYPE: &str = "整体评分";

pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 5;

/// Current time as an RFC 3339 UTC string.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses RFC 3339 timestamps, and naive ISO-8601 ones (treated as UTC)
/// as written by older producers.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Produces a fresh opaque interaction id.
pub fn generate_interaction_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Well-known rating dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RatingDimension {
    Accuracy,
    Helpfulness,
    Clarity,
    Completeness,
    Relevance,
}

impl RatingDimension {
    pub const ALL: [RatingDimension; 5] = [
        RatingDimension::Accuracy,
        RatingDimension::Helpfulness,
        RatingDimension::Clarity,
        RatingDimension::Completeness,
        RatingDimension::Relevance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RatingDimension::Accuracy => "accuracy",
            RatingDimension::Helpfulness => "helpfulness",
            RatingDimension::Clarity => "clarity",
            RatingDimension::Completeness => "completeness",
            RatingDimension::Relevance => "relevance",
        }
    }
}

impl AsRef<str> for RatingDimension {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// One user rating event, as stored in the collection file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub interaction_id: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub ratings: BTreeMap<String, u8>,
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub feedback_type: String,
    /// Scalar rating written by older producers alongside `average_rating`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    /// Keys this crate does not know about, kept so a save never drops them.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl FeedbackRecord {
    /// Rating used for statistics: `average_rating`, falling back to the
    /// legacy `rating` field. Zero means unrated.
    pub fn effective_rating(&self) -> f64 {
        if self.average_rating > 0.0 {
            return self.average_rating;
        }
        match self.rating {
            Some(r) if r > 0.0 => r,
            _ => 0.0,
        }
    }

    pub fn is_rated(&self) -> bool {
        self.effective_rating() > 0.0
    }

    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }
}

/// Caller input for one submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedbackSubmission {
    pub ratings: BTreeMap<String, u8>,
    pub overall: Option<u8>,
    pub comment: Option<String>,
    pub feedback_type: Option<String>,
}

impl FeedbackSubmission {
    /// Multi-dimension rating.
    pub fn dimensional<I, K>(ratings: I) -> Self
    where
        I: IntoIterator<Item = (K, u8)>,
        K: Into<String>,
    {
        Self {
            ratings: ratings.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            ..Self::default()
        }
    }

    /// Single overall rating with no dimensions.
    pub fn overall(rating: u8) -> Self {
        Self {
            overall: Some(rating),
            ..Self::default()
        }
    }

    pub fn with_rating(mut self, dimension: impl AsRef<str>, score: u8) -> Self {
        self.ratings.insert(dimension.as_ref().to_string(), score);
        self
    }

    pub fn with_overall(mut self, rating: u8) -> Self {
        self.overall = Some(rating);
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_feedback_type(mut self, label: impl Into<String>) -> Self {
        self.feedback_type = Some(label.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        for (dimension, score) in &self.ratings {
            if dimension.trim().is_empty() {
                return Err(Error::validation_with_context(
                    "rating dimension name must not be empty",
                    ErrorContext::new()
                        .with_field_path("ratings")
                        .with_source("submission"),
                ));
            }
            check_score(*score, &format!("ratings.{}", dimension))?;
        }
        if let Some(overall) = self.overall {
            check_score(overall, "rating")?;
        }
        if self.ratings.is_empty() && self.overall.is_none() {
            return Err(Error::validation_with_context(
                "a submission needs dimension ratings or an overall rating",
                ErrorContext::new()
                    .with_field_path("ratings")
                    .with_source("submission"),
            ));
        }
        Ok(())
    }

    /// Mean of the dimension scores, or the overall score when there are none.
    pub fn average(&self) -> f64 {
        if self.ratings.is_empty() {
            return self.overall.map(f64::from).unwrap_or(0.0);
        }
        let sum: u32 = self.ratings.values().map(|&v| u32::from(v)).sum();
        f64::from(sum) / self.ratings.len() as f64
    }

    fn resolved_feedback_type(&self) -> String {
        match &self.feedback_type {
            Some(label) => label.clone(),
            None if self.ratings.is_empty() => OVERALL_FEEDBACK_TYPE.to_string(),
            None => DIMENSIONAL_FEEDBACK_TYPE.to_string(),
        }
    }

    /// Builds the record stamped with the current time. Call `validate` first.
    pub fn into_record(
        self,
        interaction_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> FeedbackRecord {
        let average_rating = self.average();
        let feedback_type = self.resolved_feedback_type();
        FeedbackRecord {
            interaction_id: interaction_id.into(),
            timestamp: timestamp(),
            ratings: self.ratings,
            average_rating,
            comment: self.comment.filter(|c| !c.trim().is_empty()),
            session_id: session_id.into(),
            feedback_type,
            rating: None,
            extra: serde_json::Map::new(),
        }
    }
}

fn check_score(score: u8, field: &str) -> Result<()> {
    if (MIN_SCORE..=MAX_SCORE).contains(&score) {
        return Ok(());
    }
    Err(Error::validation_with_context(
        format!("score {} is outside {}..={}", score, MIN_SCORE, MAX_SCORE),
        ErrorContext::new()
            .with_field_path(field)
            .with_details(format!("got {}", score))
            .with_source("submission"),
    ))
}
