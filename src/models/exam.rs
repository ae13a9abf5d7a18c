// src/models/exam.rs

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::question::PublicQuestion;

/// Represents the 'exams' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub duration_minutes: Option<i32>,
    pub created_by: i64,
    pub is_published: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Exam row with aggregate question info, for listings.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ExamListItem {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub duration_minutes: Option<i32>,
    pub question_count: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_marks: Decimal,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Exam as presented to a test taker: ordered questions, no answer key.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamDetail {
    #[serde(flatten)]
    pub exam: Exam,
    pub questions: Vec<PublicQuestion>,
}

/// DTO for creating an exam from existing bank questions.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateExamRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(range(min = 1, max = 1440))]
    pub duration_minutes: Option<i32>,
    /// Question order in the exam follows this list.
    #[validate(length(min = 1, max = 500), custom(function = validate_unique_ids))]
    pub question_ids: Vec<i64>,
}

fn validate_unique_ids(ids: &[i64]) -> Result<(), validator::ValidationError> {
    let mut seen = HashSet::with_capacity(ids.len());
    if !ids.iter().all(|id| seen.insert(*id)) {
        return Err(validator::ValidationError::new("duplicate_question_id"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(question_ids: Vec<i64>) -> CreateExamRequest {
        CreateExamRequest {
            title: "Midterm".to_string(),
            description: None,
            duration_minutes: Some(60),
            question_ids,
        }
    }

    #[test]
    fn valid_exam_passes() {
        assert!(request(vec![1, 2, 3]).validate().is_ok());
    }

    #[test]
    fn duplicate_question_ids_rejected() {
        assert!(request(vec![1, 2, 1]).validate().is_err());
    }

    #[test]
    fn empty_question_list_rejected() {
        assert!(request(vec![]).validate().is_err());
    }

    #[test]
    fn zero_duration_rejected() {
        let mut req = request(vec![1]);
        req.duration_minutes = Some(0);
        assert!(req.validate().is_err());
    }
}
