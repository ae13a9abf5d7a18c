// src/models/question.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Upper bound for `marks` and `negative_marks`.
fn max_marks() -> Decimal {
    Decimal::new(1000, 0)
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,
    pub created_by: i64,
    pub content: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub marks: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub negative_marks: Decimal,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Represents the 'question_options' table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOption {
    pub id: i64,
    pub question_id: i64,
    pub content: String,
    pub is_correct: bool,
}

/// Author view of a question, correct flags included.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionWithOptions {
    #[serde(flatten)]
    pub question: Question,
    pub options: Vec<QuestionOption>,
}

/// DTO for sending an option to exam takers (no correct flag).
#[derive(Debug, Serialize)]
pub struct PublicOption {
    pub id: i64,
    pub content: String,
}

/// DTO for sending a question to exam takers.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    pub id: i64,
    pub content: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub marks: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub negative_marks: Decimal,
    pub options: Vec<PublicOption>,
}

impl PublicQuestion {
    pub fn from_parts(question: Question, options: Vec<QuestionOption>) -> Self {
        Self {
            id: question.id,
            content: question.content,
            marks: question.marks,
            negative_marks: question.negative_marks,
            options: options
                .into_iter()
                .map(|o| PublicOption {
                    id: o.id,
                    content: o.content,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOptionRequest {
    pub content: String,
    #[serde(default)]
    pub is_correct: bool,
}

/// DTO for creating a new question.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[validate(custom(function = validate_marks))]
    pub marks: Decimal,
    /// Penalty for a wrong or skipped answer; 0 disables negative marking.
    #[serde(default, with = "rust_decimal::serde::float")]
    #[validate(custom(function = validate_negative_marks))]
    pub negative_marks: Decimal,
    #[validate(length(min = 2, max = 10), custom(function = validate_options))]
    pub options: Vec<CreateOptionRequest>,
}

/// Marks are stored as NUMERIC(8, 2).
fn has_cents_precision(marks: &Decimal) -> bool {
    marks.normalize().scale() <= 2
}

fn validate_marks(marks: &Decimal) -> Result<(), validator::ValidationError> {
    if *marks <= Decimal::ZERO || *marks > max_marks() {
        return Err(validator::ValidationError::new("marks_out_of_range"));
    }
    if !has_cents_precision(marks) {
        return Err(validator::ValidationError::new("marks_too_precise"));
    }
    Ok(())
}

fn validate_negative_marks(marks: &Decimal) -> Result<(), validator::ValidationError> {
    if *marks < Decimal::ZERO {
        return Err(validator::ValidationError::new("negative_marks_must_not_be_negative"));
    }
    if *marks > max_marks() {
        return Err(validator::ValidationError::new("marks_out_of_range"));
    }
    if !has_cents_precision(marks) {
        return Err(validator::ValidationError::new("marks_too_precise"));
    }
    Ok(())
}

/// Every option needs text, and exactly one must be marked correct.
fn validate_options(options: &[CreateOptionRequest]) -> Result<(), validator::ValidationError> {
    for opt in options {
        if opt.content.trim().is_empty() || opt.content.len() > 500 {
            return Err(validator::ValidationError::new("option_content_length"));
        }
    }
    if options.iter().filter(|o| o.is_correct).count() != 1 {
        return Err(validator::ValidationError::new("exactly_one_correct_option"));
    }
    Ok(())
}
