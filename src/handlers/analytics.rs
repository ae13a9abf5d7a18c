// src/handlers/analytics.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    error::AppError,
    handlers::exam::owned_exam,
    services::analytics,
    utils::jwt::Claims,
};

/// Score and per-question statistics for an exam.
/// Exam author or admin only.
pub async fn exam_analytics(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(exam_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    owned_exam(&pool, exam_id, &claims).await?;

    let report = analytics::exam_analytics(&pool, exam_id).await.map_err(|e| {
        tracing::error!("Failed to build analytics for exam {}: {:?}", exam_id, e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(report))
}

/// Top scores for a published exam.
pub async fn exam_leaderboard(
    State(pool): State<PgPool>,
    Path(exam_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let published: Option<bool> =
        sqlx::query_scalar("SELECT is_published FROM exams WHERE id = $1")
            .bind(exam_id)
            .fetch_optional(&pool)
            .await?;

    if published != Some(true) {
        return Err(AppError::NotFound("Exam not found".to_string()));
    }

    let entries = analytics::leaderboard(&pool, exam_id).await.map_err(|e| {
        tracing::error!("Failed to fetch leaderboard: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(entries))
}
