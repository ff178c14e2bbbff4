// src/session/scoring.rs

use std::collections::HashMap;

use crate::models::{
    attempt::QuestionOutcome,
    quiz::{AnswerValue, Quiz},
};

/// Percentage of correct answers, rounded half-up.
///
/// Integer arithmetic: floor((200c + n) / 2n) == round_half_up(100c / n).
pub fn score_percentage(correct: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let correct = correct.min(total) as u64;
    let total = total as u64;
    ((200 * correct + total) / (2 * total)) as u32
}

/// Grades recorded answers against the quiz's answer key.
///
/// Strict equality: no trimming, no case folding. Unanswered questions are
/// incorrect. Returns (correct_count, per-question outcomes in quiz order).
pub fn grade(quiz: &Quiz, answers: &HashMap<i64, AnswerValue>) -> (usize, Vec<QuestionOutcome>) {
    let mut correct_count = 0;

    let outcomes = quiz
        .questions
        .iter()
        .map(|question| {
            let your_answer = answers.get(&question.id).cloned();
            let is_correct = your_answer.as_ref() == Some(&question.correct_answer);
            if is_correct {
                correct_count += 1;
            }
            QuestionOutcome {
                question_id: question.id,
                your_answer,
                is_correct,
            }
        })
        .collect();

    (correct_count, outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quiz::Question;

    fn quiz(answer_key: Vec<AnswerValue>) -> Quiz {
        Quiz {
            id: 1,
            title: "Test".to_string(),
            description: None,
            category: "General".to_string(),
            difficulty: "Easy".to_string(),
            time_limit: 60,
            questions: answer_key
                .into_iter()
                .enumerate()
                .map(|(i, correct_answer)| Question {
                    id: i as i64 + 1,
                    question_text: format!("Question {}", i + 1),
                    question_type: "multiple_choice".to_string(),
                    options: None,
                    correct_answer,
                })
                .collect(),
        }
    }

    #[test]
    fn test_score_percentage_rounds_half_up() {
        assert_eq!(score_percentage(3, 4), 75);
        assert_eq!(score_percentage(1, 3), 33);
        assert_eq!(score_percentage(2, 3), 67);
        assert_eq!(score_percentage(1, 8), 13);
        assert_eq!(score_percentage(0, 2), 0);
        assert_eq!(score_percentage(5, 5), 100);
    }

    #[test]
    fn test_score_percentage_stays_in_bounds() {
        for total in 1..=40 {
            for correct in 0..=total {
                let score = score_percentage(correct, total);
                let expected = (100.0 * correct as f64 / total as f64 + 0.5).floor() as u32;
                assert!(score <= 100);
                assert_eq!(score, expected, "{correct}/{total}");
            }
        }
    }

    #[test]
    fn test_grade_counts_unanswered_as_incorrect() {
        let quiz = quiz(vec![AnswerValue::Choice(0), AnswerValue::Choice(1)]);
        let mut answers = HashMap::new();
        answers.insert(1, AnswerValue::Choice(0));

        let (correct, outcomes) = grade(&quiz, &answers);
        assert_eq!(correct, 1);
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].is_correct);
        assert!(!outcomes[1].is_correct);
        assert_eq!(outcomes[1].your_answer, None);
    }

    #[test]
    fn test_grade_text_is_exact_match() {
        let quiz = quiz(vec![AnswerValue::Text("Paris".to_string())]);

        for (given, expected) in [("Paris", true), ("paris", false), (" Paris", false)] {
            let mut answers = HashMap::new();
            answers.insert(1, AnswerValue::Text(given.to_string()));
            let (correct, _) = grade(&quiz, &answers);
            assert_eq!(correct == 1, expected, "{given:?}");
        }
    }

    #[test]
    fn test_grade_ignores_answers_for_unknown_questions() {
        let quiz = quiz(vec![AnswerValue::Choice(2)]);
        let mut answers = HashMap::new();
        answers.insert(99, AnswerValue::Choice(2));

        let (correct, outcomes) = grade(&quiz, &answers);
        assert_eq!(correct, 0);
        assert_eq!(outcomes.len(), 1);
    }
}
