// src/handlers/question.rs

use std::collections::HashMap;

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use sqlx::{PgPool, Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        question::{CreateQuestionRequest, Question, QuestionOption, QuestionWithOptions},
        user::Role,
    },
    utils::{html::clean_html, jwt::Claims},
};

/// Loads options for a set of questions, grouped by question id and
/// ordered by option id (insertion order).
pub(crate) async fn fetch_options(
    pool: &PgPool,
    question_ids: &[i64],
) -> Result<HashMap<i64, Vec<QuestionOption>>, sqlx::Error> {
    let mut grouped: HashMap<i64, Vec<QuestionOption>> = HashMap::new();
    if question_ids.is_empty() {
        return Ok(grouped);
    }

    let mut query_builder = QueryBuilder::<Postgres>::new(
        "SELECT id, question_id, content, is_correct FROM question_options WHERE question_id IN (",
    );
    let mut separated = query_builder.separated(",");
    for id in question_ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(") ORDER BY id");

    let options: Vec<QuestionOption> = query_builder.build_query_as().fetch_all(pool).await?;
    for option in options {
        grouped.entry(option.question_id).or_default().push(option);
    }
    Ok(grouped)
}

/// Adds a question (with its options) to the caller's question bank.
/// Educator or admin only. Question and options are written atomically.
pub async fn create_question(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let author_id = claims.user_id()?;

    let mut tx = pool.begin().await?;

    let question = sqlx::query_as::<_, Question>(
        r#"
        INSERT INTO questions (created_by, content, marks, negative_marks)
        VALUES ($1, $2, $3, $4)
        RETURNING id, created_by, content, marks, negative_marks, created_at
        "#,
    )
    .bind(author_id)
    .bind(clean_html(&payload.content))
    .bind(payload.marks)
    .bind(payload.negative_marks)
    .fetch_one(&mut *tx)
    .await?;

    let mut query_builder = QueryBuilder::<Postgres>::new(
        "INSERT INTO question_options (question_id, content, is_correct) ",
    );
    query_builder.push_values(&payload.options, |mut row, option| {
        row.push_bind(question.id)
            .push_bind(clean_html(&option.content))
            .push_bind(option.is_correct);
    });
    query_builder.push(" RETURNING id, question_id, content, is_correct");

    let options: Vec<QuestionOption> = query_builder
        .build_query_as()
        .fetch_all(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(question_id = question.id, author_id, "Question created");

    Ok((StatusCode::CREATED, Json(QuestionWithOptions { question, options })))
}

/// Lists the caller's question bank (admins see every question).
pub async fn list_questions(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let see_all = claims.role == Role::Admin;

    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, created_by, content, marks, negative_marks, created_at
        FROM questions
        WHERE $1 OR created_by = $2
        ORDER BY id DESC
        "#,
    )
    .bind(see_all)
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    let ids: Vec<i64> = questions.iter().map(|q| q.id).collect();
    let mut options = fetch_options(&pool, &ids).await?;

    let result: Vec<QuestionWithOptions> = questions
        .into_iter()
        .map(|question| QuestionWithOptions {
            options: options.remove(&question.id).unwrap_or_default(),
            question,
        })
        .collect();

    Ok(Json(result))
}
