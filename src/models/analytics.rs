// src/models/analytics.rs

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

/// Aggregate figures for one exam, over submitted attempts only.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamAnalytics {
    pub exam_id: i64,
    pub attempt_count: i64,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub average_score: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub highest_score: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub lowest_score: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub average_accuracy: Option<Decimal>,
    pub questions: Vec<QuestionStat>,
}

/// Raw aggregate row for [`ExamAnalytics`].
#[derive(Debug, FromRow)]
pub struct AttemptAggregate {
    pub attempt_count: i64,
    pub average_score: Option<Decimal>,
    pub highest_score: Option<Decimal>,
    pub lowest_score: Option<Decimal>,
    pub average_accuracy: Option<Decimal>,
}

/// Per-question answer counts.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct QuestionStat {
    pub question_id: i64,
    pub answered_count: i64,
    pub correct_count: i64,
    /// Percentage of stored answers that were correct, 2dp.
    #[serde(with = "rust_decimal::serde::float")]
    #[sqlx(skip)]
    pub correct_rate: Decimal,
}

/// One row of an exam leaderboard.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub attempt_id: i64,
    pub username: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub score: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub accuracy: Decimal,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}
