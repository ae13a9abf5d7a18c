// src/services/submission.rs

use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    error::AppError,
    models::attempt::{SubmitAttemptResponse, SubmittedAnswer},
    services::scoring::{self, AnswerKeyRow, Catalog},
};

/// Scores a submission and stores it as one attempt plus its answer rows.
///
/// `None` (field missing or null) and an empty list are both rejected.
/// Everything after validation runs in a single transaction: on any failure
/// the transaction is rolled back and the caller only learns that the
/// submission failed. The pooled connection goes back to the pool on every
/// exit path when `tx` is dropped.
pub async fn submit_attempt(
    pool: &PgPool,
    exam_id: i64,
    student_id: i64,
    answers: Option<&[SubmittedAnswer]>,
) -> Result<SubmitAttemptResponse, AppError> {
    let answers = match answers {
        Some(answers) if !answers.is_empty() => answers,
        _ => return Err(AppError::BadRequest("Answers are required".to_string())),
    };
    for answer in answers {
        answer.validate()?;
    }

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::SubmissionFailed(format!("begin transaction: {}", e)))?;

    match score_and_persist(&mut tx, exam_id, student_id, answers).await {
        Ok(summary) => {
            tx.commit()
                .await
                .map_err(|e| AppError::SubmissionFailed(format!("commit: {}", e)))?;

            tracing::info!(
                attempt_id = summary.attempt_id,
                exam_id,
                student_id,
                score = %summary.score,
                accuracy = %summary.accuracy,
                "Attempt submitted"
            );
            Ok(summary)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!("Rollback after failed submission also failed: {:?}", rollback_err);
            }
            Err(AppError::SubmissionFailed(format!(
                "exam {} student {}: {}",
                exam_id, student_id, e
            )))
        }
    }
}

/// Loads the answer key for an exam: every exam question joined with its
/// correct option. Questions without a correct option are not scored.
pub async fn load_catalog(conn: &mut PgConnection, exam_id: i64) -> Result<Catalog, sqlx::Error> {
    let rows = sqlx::query_as::<_, AnswerKeyRow>(
        r#"
        SELECT
            q.id AS question_id,
            q.marks,
            q.negative_marks,
            o.id AS correct_option_id
        FROM exam_questions eq
        JOIN questions q ON q.id = eq.question_id
        JOIN question_options o ON o.question_id = q.id AND o.is_correct
        WHERE eq.exam_id = $1
        ORDER BY eq.position
        "#,
    )
    .bind(exam_id)
    .fetch_all(&mut *conn)
    .await?;

    let catalog = Catalog::new(rows);
    tracing::debug!(exam_id, questions = catalog.len(), "Loaded answer key");
    Ok(catalog)
}

async fn score_and_persist(
    conn: &mut PgConnection,
    exam_id: i64,
    student_id: i64,
    answers: &[SubmittedAnswer],
) -> Result<SubmitAttemptResponse, sqlx::Error> {
    let catalog = load_catalog(conn, exam_id).await?;
    let max_score = catalog.max_score();

    // Score and accuracy are filled in once every answer has been graded.
    let attempt_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO attempts (exam_id, student_id, max_score)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(exam_id)
    .bind(student_id)
    .bind(max_score)
    .fetch_one(&mut *conn)
    .await?;

    let grade = scoring::grade(&catalog, answers);

    if !grade.answers.is_empty() {
        let mut query_builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO attempt_answers
                (attempt_id, question_id, selected_option_id, is_correct, time_spent_sec) ",
        );
        query_builder.push_values(&grade.answers, |mut row, answer| {
            row.push_bind(attempt_id)
                .push_bind(answer.question_id)
                .push_bind(answer.selected_option_id)
                .push_bind(answer.is_correct)
                .push_bind(answer.time_spent_sec);
        });
        query_builder.build().execute(&mut *conn).await?;
    }

    sqlx::query(
        r#"
        UPDATE attempts
        SET score = $1, accuracy = $2, submitted_at = NOW()
        WHERE id = $3
        "#,
    )
    .bind(grade.score)
    .bind(grade.accuracy)
    .bind(attempt_id)
    .execute(&mut *conn)
    .await?;

    Ok(SubmitAttemptResponse {
        attempt_id,
        score: grade.score,
        max_score,
        accuracy: grade.accuracy,
    })
}
