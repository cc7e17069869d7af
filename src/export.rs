//! CSV export of the feedback collection.
//!
//! One row per record. Per-dimension scores are flattened into
//! `rating_<dimension>` columns, one per dimension seen anywhere in the
//! collection.

use crate::FeedbackRecord;
use std::collections::BTreeSet;

const BASE_COLUMNS: [&str; 6] = [
    "interaction_id",
    "timestamp",
    "average_rating",
    "comment",
    "session_id",
    "feedback_type",
];

pub const DIMENSION_COLUMN_PREFIX: &str = "rating_";

/// Returns an empty string for an empty collection.
pub fn to_csv(records: &[FeedbackRecord]) -> String {
    if records.is_empty() {
        return String::new();
    }

    let dimensions: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.ratings.keys().map(String::as_str))
        .collect();

    let mut out = String::new();
    let header = BASE_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(
            dimensions
                .iter()
                .map(|d| format!("{}{}", DIMENSION_COLUMN_PREFIX, d)),
        )
        .map(|c| escape_field(&c))
        .collect::<Vec<_>>();
    push_row(&mut out, &header);

    for r in records {
        let mut row = vec![
            escape_field(&r.interaction_id),
            escape_field(&r.timestamp),
            r.effective_rating().to_string(),
            escape_field(r.comment.as_deref().unwrap_or("")),
            escape_field(&r.session_id),
            escape_field(&r.feedback_type),
        ];
        row.extend(dimensions.iter().map(|d| {
            r.ratings
                .get(*d)
                .map(|v| v.to_string())
                .unwrap_or_default()
        }));
        push_row(&mut out, &row);
    }
    out
}

fn push_row(out: &mut String, fields: &[String]) {
    out.push_str(&fields.join(","));
    out.push('\n');
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FeedbackSubmission;

    #[test]
    fn test_empty_is_empty_string() {
        assert_eq!(to_csv(&[]), "");
    }

    #[test]
    fn test_dimension_columns_union() {
        let records = vec![
            FeedbackSubmission::dimensional([("accuracy", 5), ("helpfulness", 3)])
                .into_record("a", "s"),
            FeedbackSubmission::dimensional([("clarity", 2)]).into_record("b", "s"),
            FeedbackSubmission::overall(4).into_record("c", "s"),
        ];
        let csv = to_csv(&records);
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            "interaction_id,timestamp,average_rating,comment,session_id,feedback_type,\
             rating_accuracy,rating_clarity,rating_helpfulness"
        );
        assert!(lines[1].starts_with("a,"));
        assert!(lines[1].ends_with(",4,,s,多维度评分,5,,3"));
        assert!(lines[2].ends_with(",,2,"));
        assert!(lines[3].ends_with(",4,,s,整体评分,,,"));
    }

    #[test]
    fn test_quoting() {
        let record = FeedbackSubmission::overall(3)
            .with_comment("good, but \"slow\"\nsecond line")
            .into_record("q", "s");
        let csv = to_csv(&[record]);
        assert!(csv.contains("\"good, but \"\"slow\"\"\nsecond line\""));
    }
}
