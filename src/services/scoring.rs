// src/services/scoring.rs

//! Pure grading rules for an exam submission.
//!
//! Nothing here touches the database: the submission service loads the
//! answer key, calls [`grade`], and persists what comes back.

use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy, prelude::FromPrimitive};
use sqlx::FromRow;

use crate::models::attempt::SubmittedAnswer;

/// One scored question of an exam, as read from the catalog join.
#[derive(Debug, Clone, FromRow)]
pub struct AnswerKeyRow {
    pub question_id: i64,
    pub marks: Decimal,
    pub negative_marks: Decimal,
    pub correct_option_id: i64,
}

#[derive(Debug, Clone, Copy)]
struct AnswerKey {
    correct_option_id: i64,
    marks: Decimal,
    negative_marks: Decimal,
}

/// Answer key for a whole exam.
///
/// `max_score` covers every scored question, answered or not.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    keys: HashMap<i64, AnswerKey>,
    max_score: Decimal,
}

impl Catalog {
    pub fn new(rows: impl IntoIterator<Item = AnswerKeyRow>) -> Self {
        let mut keys = HashMap::new();
        for row in rows {
            keys.insert(
                row.question_id,
                AnswerKey {
                    correct_option_id: row.correct_option_id,
                    marks: row.marks,
                    negative_marks: row.negative_marks,
                },
            );
        }
        let max_score = keys.values().map(|k| k.marks).sum();
        Self { keys, max_score }
    }

    pub fn max_score(&self) -> Decimal {
        self.max_score
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// A submitted answer that matched a catalog question and will be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct GradedAnswer {
    pub question_id: i64,
    pub selected_option_id: Option<i64>,
    pub is_correct: bool,
    pub time_spent_sec: Decimal,
}

/// Outcome of grading one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Grade {
    pub score: Decimal,
    pub correct_count: usize,
    /// Every answer in the request, matched or not.
    pub submitted_count: usize,
    pub accuracy: Decimal,
    /// Matched answers only, in input order.
    pub answers: Vec<GradedAnswer>,
}

/// Grades `answers` against `catalog`.
///
/// * Unknown question ids are dropped: no score, no stored row, but they
///   still count in the accuracy denominator.
/// * A correct selection adds `marks`.
/// * A wrong or missing selection subtracts `negative_marks`.
pub fn grade(catalog: &Catalog, answers: &[SubmittedAnswer]) -> Grade {
    let mut score = Decimal::ZERO;
    let mut correct_count = 0;
    let mut graded = Vec::with_capacity(answers.len());

    for answer in answers {
        let Some(key) = catalog.keys.get(&answer.question_id) else {
            tracing::debug!(question_id = answer.question_id, "Ignoring answer for unknown question");
            continue;
        };

        let is_correct = answer.selected_option_id == Some(key.correct_option_id);
        if is_correct {
            score += key.marks;
            correct_count += 1;
        } else {
            score -= key.negative_marks;
        }

        graded.push(GradedAnswer {
            question_id: answer.question_id,
            selected_option_id: answer.selected_option_id,
            is_correct,
            time_spent_sec: answer
                .time_spent_sec
                .and_then(Decimal::from_f64)
                .map_or(Decimal::ZERO, round2),
        });
    }

    Grade {
        score,
        correct_count,
        submitted_count: answers.len(),
        accuracy: accuracy(correct_count, answers.len()),
        answers: graded,
    }
}

/// `100 * correct / submitted`, rounded half away from zero to 2 places.
/// Zero when nothing was submitted.
pub fn accuracy(correct: usize, submitted: usize) -> Decimal {
    if submitted == 0 {
        return Decimal::ZERO;
    }
    let ratio = Decimal::from(correct as u64 * 100) / Decimal::from(submitted as u64);
    round2(ratio)
}

/// Rounds to 2 decimal places for storage; formatting is left to callers.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn key_row(question_id: i64, marks: &str, negative: &str, correct: i64) -> AnswerKeyRow {
        AnswerKeyRow {
            question_id,
            marks: dec(marks),
            negative_marks: dec(negative),
            correct_option_id: correct,
        }
    }

    fn answer(question_id: i64, selected: Option<i64>) -> SubmittedAnswer {
        SubmittedAnswer {
            question_id,
            selected_option_id: selected,
            time_spent_sec: None,
        }
    }

    #[test]
    fn two_question_example() {
        // Q1: 2 marks, -0.5, correct option 10. Q2: 3 marks, -1, correct option 20.
        let catalog = Catalog::new([key_row(1, "2", "0.5", 10), key_row(2, "3", "1", 20)]);
        let result = grade(&catalog, &[answer(1, Some(10)), answer(2, Some(21))]);

        assert_eq!(catalog.max_score(), dec("5"));
        assert_eq!(result.score, dec("1"));
        assert_eq!(result.correct_count, 1);
        assert_eq!(result.accuracy, dec("50.00"));
        assert_eq!(result.answers.len(), 2);
        assert!(result.answers[0].is_correct);
        assert!(!result.answers[1].is_correct);
    }

    #[test]
    fn max_score_ignores_coverage() {
        let catalog = Catalog::new([
            key_row(1, "1.5", "0", 10),
            key_row(2, "2.5", "0", 20),
            key_row(3, "4", "0", 30),
        ]);
        let result = grade(&catalog, &[answer(1, Some(10))]);

        assert_eq!(catalog.max_score(), dec("8"));
        assert_eq!(result.score, dec("1.5"));
        assert_eq!(result.accuracy, dec("100"));
    }

    #[test]
    fn unknown_question_dropped_but_counted() {
        let catalog = Catalog::new([key_row(1, "2", "1", 10)]);
        let result = grade(&catalog, &[answer(1, Some(10)), answer(99, Some(10))]);

        assert_eq!(result.score, dec("2"));
        assert_eq!(result.answers.len(), 1);
        assert_eq!(result.answers[0].question_id, 1);
        assert_eq!(result.submitted_count, 2);
        assert_eq!(result.accuracy, dec("50.00"));
    }

    #[test]
    fn skipped_answer_is_penalized() {
        let catalog = Catalog::new([key_row(1, "2", "0.25", 10)]);
        let result = grade(&catalog, &[answer(1, None)]);

        assert_eq!(result.score, dec("-0.25"));
        assert_eq!(result.answers[0].selected_option_id, None);
        assert!(!result.answers[0].is_correct);
        assert_eq!(result.accuracy, Decimal::ZERO);
    }

    #[test]
    fn score_can_go_negative() {
        let catalog = Catalog::new([key_row(1, "1", "2", 10), key_row(2, "1", "2", 20)]);
        let result = grade(&catalog, &[answer(1, Some(11)), answer(2, Some(21))]);
        assert_eq!(result.score, dec("-4"));
    }

    #[test]
    fn no_negative_marking_never_goes_below_zero() {
        let catalog = Catalog::new([key_row(1, "1", "0", 10), key_row(2, "1", "0", 20)]);
        let result = grade(&catalog, &[answer(1, Some(11)), answer(2, None)]);
        assert_eq!(result.score, Decimal::ZERO);
    }

    #[test]
    fn single_question_full_marks() {
        let catalog = Catalog::new([key_row(1, "4", "1", 10)]);
        let result = grade(&catalog, &[answer(1, Some(10))]);

        assert_eq!(result.score, dec("4"));
        assert_eq!(result.score, catalog.max_score());
        assert_eq!(result.accuracy, dec("100.00"));
    }

    #[test]
    fn accuracy_rounds_to_two_places() {
        assert_eq!(accuracy(1, 3), dec("33.33"));
        assert_eq!(accuracy(2, 3), dec("66.67"));
        assert_eq!(accuracy(0, 0), Decimal::ZERO);
        assert_eq!(accuracy(7, 7), dec("100"));
    }

    #[test]
    fn duplicate_answers_each_scored() {
        let catalog = Catalog::new([key_row(1, "2", "1", 10)]);
        let result = grade(&catalog, &[answer(1, Some(10)), answer(1, Some(11))]);

        assert_eq!(result.score, dec("1"));
        assert_eq!(result.answers.len(), 2);
        assert_eq!(result.accuracy, dec("50.00"));
    }

    #[test]
    fn time_spent_defaults_to_zero() {
        let catalog = Catalog::new([key_row(1, "1", "0", 10)]);
        let mut timed = answer(1, Some(10));
        timed.time_spent_sec = Some(42.0);
        let mut fractional = answer(1, Some(10));
        fractional.time_spent_sec = Some(12.346);
        let result = grade(&catalog, &[answer(1, Some(10)), timed, fractional]);

        assert_eq!(result.answers[0].time_spent_sec, Decimal::ZERO);
        assert_eq!(result.answers[1].time_spent_sec, dec("42"));
        assert_eq!(result.answers[2].time_spent_sec, dec("12.35"));
    }

    #[test]
    fn empty_catalog_scores_nothing() {
        let catalog = Catalog::default();
        let result = grade(&catalog, &[answer(1, Some(10))]);

        assert!(catalog.is_empty());
        assert_eq!(catalog.max_score(), Decimal::ZERO);
        assert_eq!(result.score, Decimal::ZERO);
        assert!(result.answers.is_empty());
        assert_eq!(result.accuracy, Decimal::ZERO);
    }
}
