// src/models/attempt.rs

use rust_decimal::{Decimal, prelude::FromPrimitive};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// One answer as sent by the student.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    pub question_id: i64,

    /// `None` means the question was skipped.
    #[serde(default)]
    pub selected_option_id: Option<i64>,

    /// Seconds, fractions allowed.
    #[serde(default)]
    #[validate(custom(function = validate_time_spent))]
    pub time_spent_sec: Option<f64>,
}

fn validate_time_spent(secs: f64) -> Result<(), validator::ValidationError> {
    if secs < 0.0 || Decimal::from_f64(secs).is_none() {
        return Err(validator::ValidationError::new("time_spent_must_be_non_negative"));
    }
    Ok(())
}

/// DTO for `POST /api/exams/{id}/submit`.
/// A missing or null `answers` field deserializes to `None` so it is
/// reported as a validation error rather than a JSON rejection.
#[derive(Debug, Deserialize)]
pub struct SubmitAttemptRequest {
    #[serde(default)]
    pub answers: Option<Vec<SubmittedAnswer>>,
}

/// Result of a successful submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAttemptResponse {
    pub attempt_id: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub score: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub max_score: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub accuracy: Decimal,
}

/// Represents the 'attempts' table in the database.
/// `score`, `accuracy` and `submitted_at` stay NULL until scoring finishes,
/// which happens inside the same transaction as the insert.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub id: i64,
    pub exam_id: i64,
    pub student_id: i64,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub score: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float")]
    pub max_score: Decimal,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub accuracy: Option<Decimal>,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub submitted_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Represents the 'attempt_answers' table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptAnswer {
    pub id: i64,
    pub attempt_id: i64,
    pub question_id: i64,
    pub selected_option_id: Option<i64>,
    pub is_correct: bool,
    #[serde(with = "rust_decimal::serde::float")]
    pub time_spent_sec: Decimal,
}

/// Attempt row joined with its exam title, for "my attempts" listings.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AttemptSummary {
    pub id: i64,
    pub exam_id: i64,
    pub exam_title: String,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub score: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float")]
    pub max_score: Decimal,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub accuracy: Option<Decimal>,
    pub submitted_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Full attempt review: the attempt plus every stored answer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptDetail {
    #[serde(flatten)]
    pub attempt: Attempt,
    pub answers: Vec<AttemptAnswer>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_null_answers_are_none() {
        let req: SubmitAttemptRequest = serde_json::from_str("{}").unwrap();
        assert!(req.answers.is_none());
        let req: SubmitAttemptRequest = serde_json::from_str(r#"{"answers":null}"#).unwrap();
        assert!(req.answers.is_none());
    }

    #[test]
    fn fractional_time_spent_is_accepted() {
        let req: SubmitAttemptRequest =
            serde_json::from_str(r#"{"answers":[{"questionId":1,"timeSpentSec":12.5}]}"#).unwrap();
        let answers = req.answers.unwrap();
        assert_eq!(answers[0].time_spent_sec, Some(12.5));
        assert!(answers[0].validate().is_ok());
    }

    #[test]
    fn negative_time_spent_is_rejected() {
        let req: SubmitAttemptRequest =
            serde_json::from_str(r#"{"answers":[{"questionId":1,"timeSpentSec":-1}]}"#).unwrap();
        assert!(req.answers.unwrap()[0].validate().is_err());
    }

    #[test]
    fn skipped_answer_has_no_selection() {
        let req: SubmitAttemptRequest =
            serde_json::from_str(r#"{"answers":[{"questionId":7}]}"#).unwrap();
        let answers = req.answers.unwrap();
        assert_eq!(answers[0].question_id, 7);
        assert_eq!(answers[0].selected_option_id, None);
        assert_eq!(answers[0].time_spent_sec, None);
    }

    #[test]
    fn response_serializes_numbers_not_strings() {
        let resp = SubmitAttemptResponse {
            attempt_id: 1,
            score: Decimal::new(1, 0),
            max_score: Decimal::new(5, 0),
            accuracy: Decimal::new(5000, 2),
        };
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["attemptId"], 1);
        assert_eq!(value["accuracy"].as_f64(), Some(50.0));
        assert_eq!(value["maxScore"].as_f64(), Some(5.0));
    }
}
