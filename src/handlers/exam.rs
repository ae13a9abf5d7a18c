// src/handlers/exam.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    error::AppError,
    handlers::question::fetch_options,
    models::{
        exam::{CreateExamRequest, Exam, ExamDetail, ExamListItem},
        question::{PublicQuestion, Question},
        user::Role,
    },
    utils::{
        html::{clean_html, clean_optional},
        jwt::Claims,
    },
};

const EXAM_COLUMNS: &str =
    "id, title, description, duration_minutes, created_by, is_published, created_at";

async fn find_exam(pool: &PgPool, exam_id: i64) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!("SELECT {} FROM exams WHERE id = $1", EXAM_COLUMNS))
        .bind(exam_id)
        .fetch_optional(pool)
        .await
}

/// Loads an exam the caller may manage: its author, or any admin.
/// Missing exams are 404; someone else's exam is 403.
pub(crate) async fn owned_exam(
    pool: &PgPool,
    exam_id: i64,
    claims: &Claims,
) -> Result<Exam, AppError> {
    let exam = find_exam(pool, exam_id)
        .await?
        .ok_or(AppError::NotFound("Exam not found".to_string()))?;

    if claims.role != Role::Admin && exam.created_by != claims.user_id()? {
        return Err(AppError::Forbidden("Not the author of this exam".to_string()));
    }
    Ok(exam)
}

/// Lists published exams with question count and total marks.
pub async fn list_exams(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let exams = sqlx::query_as::<_, ExamListItem>(
        r#"
        SELECT
            e.id, e.title, e.description, e.duration_minutes, e.created_at,
            COUNT(q.id) AS question_count,
            COALESCE(SUM(q.marks), 0) AS total_marks
        FROM exams e
        LEFT JOIN exam_questions eq ON eq.exam_id = e.id
        LEFT JOIN questions q ON q.id = eq.question_id
        WHERE e.is_published
        GROUP BY e.id
        ORDER BY e.created_at DESC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list exams: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(exams))
}

/// Returns an exam with its ordered questions, without the answer key.
/// Drafts are only visible to their author and admins.
pub async fn get_exam(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(exam_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let exam = find_exam(&pool, exam_id)
        .await?
        .ok_or(AppError::NotFound("Exam not found".to_string()))?;

    let can_see_draft = claims.role == Role::Admin || exam.created_by == claims.user_id()?;
    if !exam.is_published && !can_see_draft {
        return Err(AppError::NotFound("Exam not found".to_string()));
    }

    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT q.id, q.created_by, q.content, q.marks, q.negative_marks, q.created_at
        FROM exam_questions eq
        JOIN questions q ON q.id = eq.question_id
        WHERE eq.exam_id = $1
        ORDER BY eq.position
        "#,
    )
    .bind(exam_id)
    .fetch_all(&pool)
    .await?;

    let ids: Vec<i64> = questions.iter().map(|q| q.id).collect();
    let mut options = fetch_options(&pool, &ids).await?;

    let questions = questions
        .into_iter()
        .map(|q| {
            let opts = options.remove(&q.id).unwrap_or_default();
            PublicQuestion::from_parts(q, opts)
        })
        .collect();

    Ok(Json(ExamDetail { exam, questions }))
}

/// Creates a draft exam from existing questions.
/// Educator or admin only.
pub async fn create_exam(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let author_id = claims.user_id()?;

    let mut tx = pool.begin().await?;

    let found: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE id = ANY($1)")
        .bind(&payload.question_ids)
        .fetch_one(&mut *tx)
        .await?;

    if usize::try_from(found) != Ok(payload.question_ids.len()) {
        return Err(AppError::BadRequest(
            "One or more questions do not exist".to_string(),
        ));
    }

    let exam = sqlx::query_as::<_, Exam>(&format!(
        r#"
        INSERT INTO exams (title, description, duration_minutes, created_by)
        VALUES ($1, $2, $3, $4)
        RETURNING {}
        "#,
        EXAM_COLUMNS
    ))
    .bind(clean_html(&payload.title))
    .bind(clean_optional(payload.description.as_deref()))
    .bind(payload.duration_minutes)
    .bind(author_id)
    .fetch_one(&mut *tx)
    .await?;

    let mut query_builder =
        QueryBuilder::<Postgres>::new("INSERT INTO exam_questions (exam_id, question_id, position) ");
    query_builder.push_values(
        payload.question_ids.iter().enumerate(),
        |mut row, (position, question_id)| {
            row.push_bind(exam.id)
                .push_bind(*question_id)
                .push_bind(position as i32);
        },
    );
    query_builder.build().execute(&mut *tx).await?;

    tx.commit().await?;

    tracing::info!(exam_id = exam.id, author_id, "Exam created");

    Ok((StatusCode::CREATED, Json(exam)))
}

/// Publishes a draft so students can see and take it.
pub async fn publish_exam(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(exam_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    owned_exam(&pool, exam_id, &claims).await?;

    let exam = sqlx::query_as::<_, Exam>(&format!(
        "UPDATE exams SET is_published = TRUE WHERE id = $1 RETURNING {}",
        EXAM_COLUMNS
    ))
    .bind(exam_id)
    .fetch_one(&pool)
    .await?;

    tracing::info!(exam_id, "Exam published");

    Ok(Json(exam))
}
