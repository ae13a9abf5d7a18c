// src/handlers/attempt.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::{
        attempt::{Attempt, AttemptAnswer, AttemptDetail, AttemptSummary, SubmitAttemptRequest},
        user::Role,
    },
    services::submission,
    utils::jwt::Claims,
};

/// Submits a student's answers for an exam and returns the graded summary.
///
/// * 400 when `answers` is missing, null or empty, or a time is negative.
/// * 500 "Submission failed" for any failure inside the scoring transaction.
pub async fn submit_exam(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(exam_id): Path<i64>,
    Json(req): Json<SubmitAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.user_id()?;
    let summary =
        submission::submit_attempt(&pool, exam_id, student_id, req.answers.as_deref()).await?;
    Ok(Json(summary))
}

/// Lists the caller's attempts, newest first.
pub async fn my_attempts(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.user_id()?;

    let attempts = sqlx::query_as::<_, AttemptSummary>(
        r#"
        SELECT
            a.id, a.exam_id, e.title AS exam_title,
            a.score, a.max_score, a.accuracy, a.submitted_at
        FROM attempts a
        JOIN exams e ON e.id = a.exam_id
        WHERE a.student_id = $1
        ORDER BY a.started_at DESC, a.id DESC
        "#,
    )
    .bind(student_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(attempts))
}

/// Returns one attempt with every stored answer.
/// Visible to the student who made it, the exam's author, and admins.
pub async fn get_attempt(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(attempt_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let attempt = sqlx::query_as::<_, Attempt>(
        r#"
        SELECT a.id, a.exam_id, a.student_id, a.score, a.max_score, a.accuracy,
               a.started_at, a.submitted_at
        FROM attempts a
        JOIN exams e ON e.id = a.exam_id
        WHERE a.id = $1
          AND ($2 OR a.student_id = $3 OR e.created_by = $3)
        "#,
    )
    .bind(attempt_id)
    .bind(claims.role == Role::Admin)
    .bind(user_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Attempt not found".to_string()))?;

    let answers = sqlx::query_as::<_, AttemptAnswer>(
        r#"
        SELECT id, attempt_id, question_id, selected_option_id, is_correct, time_spent_sec
        FROM attempt_answers
        WHERE attempt_id = $1
        ORDER BY id
        "#,
    )
    .bind(attempt_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(AttemptDetail { attempt, answers }))
}
