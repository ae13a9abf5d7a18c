// src/services/analytics.rs

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{
    models::analytics::{AttemptAggregate, ExamAnalytics, LeaderboardEntry, QuestionStat},
    services::scoring::{accuracy, round2},
};

const LEADERBOARD_SIZE: i64 = 10;

/// Builds the analytics report for an exam.
/// Attempts that never reached `submitted_at` are excluded.
pub async fn exam_analytics(pool: &PgPool, exam_id: i64) -> Result<ExamAnalytics, sqlx::Error> {
    let aggregate = sqlx::query_as::<_, AttemptAggregate>(
        r#"
        SELECT
            COUNT(*) AS attempt_count,
            AVG(score) AS average_score,
            MAX(score) AS highest_score,
            MIN(score) AS lowest_score,
            AVG(accuracy) AS average_accuracy
        FROM attempts
        WHERE exam_id = $1 AND submitted_at IS NOT NULL
        "#,
    )
    .bind(exam_id)
    .fetch_one(pool)
    .await?;

    let questions = sqlx::query_as::<_, QuestionStat>(
        r#"
        SELECT
            eq.question_id,
            COUNT(aa.id) AS answered_count,
            COUNT(aa.id) FILTER (WHERE aa.is_correct) AS correct_count
        FROM exam_questions eq
        LEFT JOIN attempts a
            ON a.exam_id = eq.exam_id AND a.submitted_at IS NOT NULL
        LEFT JOIN attempt_answers aa
            ON aa.attempt_id = a.id AND aa.question_id = eq.question_id
        WHERE eq.exam_id = $1
        GROUP BY eq.question_id, eq.position
        ORDER BY eq.position
        "#,
    )
    .bind(exam_id)
    .fetch_all(pool)
    .await?;

    Ok(build_report(exam_id, aggregate, questions))
}

fn build_report(
    exam_id: i64,
    aggregate: AttemptAggregate,
    mut questions: Vec<QuestionStat>,
) -> ExamAnalytics {
    for stat in &mut questions {
        stat.correct_rate = percentage(stat.correct_count, stat.answered_count);
    }

    ExamAnalytics {
        exam_id,
        attempt_count: aggregate.attempt_count,
        average_score: aggregate.average_score.map(round2),
        highest_score: aggregate.highest_score,
        lowest_score: aggregate.lowest_score,
        average_accuracy: aggregate.average_accuracy.map(round2),
        questions,
    }
}

/// Top submitted attempts for an exam, best score first, accuracy breaking ties.
pub async fn leaderboard(pool: &PgPool, exam_id: i64) -> Result<Vec<LeaderboardEntry>, sqlx::Error> {
    sqlx::query_as::<_, LeaderboardEntry>(
        r#"
        SELECT
            a.id AS attempt_id,
            u.username,
            a.score,
            a.accuracy,
            a.submitted_at
        FROM attempts a
        JOIN users u ON u.id = a.student_id
        WHERE a.exam_id = $1
          AND a.submitted_at IS NOT NULL
          AND a.score IS NOT NULL
          AND a.accuracy IS NOT NULL
        ORDER BY a.score DESC, a.accuracy DESC, a.submitted_at ASC
        LIMIT $2
        "#,
    )
    .bind(exam_id)
    .bind(LEADERBOARD_SIZE)
    .fetch_all(pool)
    .await
}

/// `100 * part / whole` at 2dp; zero when `whole` is zero.
pub fn percentage(part: i64, whole: i64) -> Decimal {
    accuracy(part.max(0) as usize, whole.max(0) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn stat(question_id: i64, answered: i64, correct: i64) -> QuestionStat {
        QuestionStat {
            question_id,
            answered_count: answered,
            correct_count: correct,
            correct_rate: Decimal::ZERO,
        }
    }

    #[test]
    fn report_rounds_averages_and_fills_rates() {
        let aggregate = AttemptAggregate {
            attempt_count: 3,
            average_score: Some(Decimal::from_str("2.3333333").unwrap()),
            highest_score: Some(Decimal::from(4)),
            lowest_score: Some(Decimal::from(-1)),
            average_accuracy: Some(Decimal::from_str("61.115").unwrap()),
        };
        let report = build_report(9, aggregate, vec![stat(1, 3, 2), stat(2, 0, 0)]);

        assert_eq!(report.exam_id, 9);
        assert_eq!(report.average_score, Some(Decimal::from_str("2.33").unwrap()));
        assert_eq!(report.average_accuracy, Some(Decimal::from_str("61.12").unwrap()));
        assert_eq!(report.questions[0].correct_rate, Decimal::from_str("66.67").unwrap());
        assert_eq!(report.questions[1].correct_rate, Decimal::ZERO);
    }

    #[test]
    fn empty_exam_reports_nulls() {
        let aggregate = AttemptAggregate {
            attempt_count: 0,
            average_score: None,
            highest_score: None,
            lowest_score: None,
            average_accuracy: None,
        };
        let report = build_report(1, aggregate, Vec::new());

        assert_eq!(report.attempt_count, 0);
        assert!(report.average_score.is_none());
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["averageScore"].is_null());
    }

    #[test]
    fn percentage_handles_zero_whole() {
        assert_eq!(percentage(0, 0), Decimal::ZERO);
        assert_eq!(percentage(1, 4), Decimal::from(25));
    }
}
