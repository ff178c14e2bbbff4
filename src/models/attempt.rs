// src/models/attempt.rs

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::quiz::{AnswerValue, Quiz};

/// Scored outcome of one completed attempt. Computed once per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizResult {
    pub quiz_id: i64,
    pub quiz_title: String,
    pub total_questions: usize,
    pub correct_answers: usize,
    pub incorrect_answers: usize,
    /// Percentage, 0..=100.
    pub score: u32,
    /// Elapsed seconds between start and completion.
    pub time_taken: u64,
    pub completed_at: DateTime<Utc>,
    pub outcomes: Vec<QuestionOutcome>,
}

/// Per-question breakdown. The correct answer is not echoed back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOutcome {
    pub question_id: i64,
    pub your_answer: Option<AnswerValue>,
    pub is_correct: bool,
}

/// DTO posted to the attempt log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub user_id: String,
    pub quiz_id: i64,
    pub score: u32,
    pub total_questions: usize,
    pub time_taken: u64,
    pub completed_at: DateTime<Utc>,
    /// Per-question outcomes, used for question analytics.
    #[serde(default)]
    pub detailed_results: Vec<QuestionOutcome>,
}

impl AttemptRecord {
    pub fn new(user_id: &str, result: &QuizResult) -> Self {
        Self {
            user_id: user_id.to_owned(),
            quiz_id: result.quiz_id,
            score: result.score,
            total_questions: result.total_questions,
            time_taken: result.time_taken,
            completed_at: result.completed_at,
            detailed_results: result.outcomes.clone(),
        }
    }
}

/// Aggregated leaderboard row, as served by the attempt log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub username: String,
    pub total_score: i64,
    pub quizzes_taken: i64,
    pub average_score: f64,
}

/// One past attempt of the current user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub quiz_id: i64,
    pub quiz_title: String,
    #[serde(default)]
    pub category: Option<String>,
    pub score: u32,
    pub total_questions: usize,
    pub time_taken: u64,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBucket {
    pub range: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAttempts {
    pub date: NaiveDate,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionStat {
    pub question: String,
    /// Percentage of attempts that answered correctly.
    pub correct_rate: f64,
    pub total_attempts: i64,
}

/// Per-quiz results overview for quiz authors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizAnalytics {
    #[serde(default)]
    pub quiz_id: i64,
    pub total_attempts: i64,
    pub average_score: f64,
    #[serde(default)]
    pub score_distribution: Vec<ScoreBucket>,
    #[serde(default)]
    pub attempts_over_time: Vec<DailyAttempts>,
    #[serde(default)]
    pub question_analytics: Vec<QuestionStat>,
}

const SCORE_RANGES: [(&str, u32); 4] = [("0-25", 25), ("26-50", 50), ("51-75", 75), ("76-100", 100)];

impl QuizAnalytics {
    /// Aggregates the attempts recorded for `quiz`. Records of other quizzes
    /// are ignored.
    pub fn from_attempts(quiz: &Quiz, records: &[AttemptRecord]) -> Self {
        let attempts: Vec<&AttemptRecord> =
            records.iter().filter(|r| r.quiz_id == quiz.id).collect();

        if attempts.is_empty() {
            return Self {
                quiz_id: quiz.id,
                total_attempts: 0,
                average_score: 0.0,
                score_distribution: Vec::new(),
                attempts_over_time: Vec::new(),
                question_analytics: Vec::new(),
            };
        }

        let total: u64 = attempts.iter().map(|a| u64::from(a.score)).sum();
        let average = total as f64 / attempts.len() as f64;

        let score_distribution = SCORE_RANGES
            .iter()
            .enumerate()
            .map(|(i, (range, upper))| {
                let lower = if i == 0 { 0 } else { SCORE_RANGES[i - 1].1 + 1 };
                ScoreBucket {
                    range: range.to_string(),
                    count: attempts
                        .iter()
                        .filter(|a| (lower..=*upper).contains(&a.score.min(100)))
                        .count() as i64,
                }
            })
            .collect();

        let mut by_date: BTreeMap<NaiveDate, i64> = BTreeMap::new();
        for attempt in &attempts {
            *by_date.entry(attempt.completed_at.date_naive()).or_default() += 1;
        }

        let question_analytics = quiz
            .questions
            .iter()
            .map(|question| {
                let outcomes: Vec<bool> = attempts
                    .iter()
                    .filter_map(|a| {
                        a.detailed_results
                            .iter()
                            .find(|o| o.question_id == question.id)
                            .map(|o| o.is_correct)
                    })
                    .collect();
                let correct = outcomes.iter().filter(|c| **c).count();
                let correct_rate = if outcomes.is_empty() {
                    0.0
                } else {
                    (correct as f64 / outcomes.len() as f64 * 1000.0).round() / 10.0
                };
                QuestionStat {
                    question: question.question_text.clone(),
                    correct_rate,
                    total_attempts: outcomes.len() as i64,
                }
            })
            .collect();

        Self {
            quiz_id: quiz.id,
            total_attempts: attempts.len() as i64,
            average_score: (average * 10.0).round() / 10.0,
            score_distribution,
            attempts_over_time: by_date
                .into_iter()
                .map(|(date, count)| DailyAttempts { date, count })
                .collect(),
            question_analytics,
        }
    }
}

/// Profile statistics derived from a user's history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserStats {
    pub quizzes_completed: usize,
    /// Rounded to one decimal place.
    pub average_score: f64,
    pub perfect_scores: usize,
    /// Fastest completion in seconds, 0 without history.
    pub fastest_time: u64,
    pub categories_explored: usize,
}

impl UserStats {
    pub fn from_history(history: &[HistoryEntry]) -> Self {
        if history.is_empty() {
            return Self {
                quizzes_completed: 0,
                average_score: 0.0,
                perfect_scores: 0,
                fastest_time: 0,
                categories_explored: 0,
            };
        }

        let total: u64 = history.iter().map(|h| u64::from(h.score)).sum();
        let average = total as f64 / history.len() as f64;

        let categories: HashSet<&str> = history
            .iter()
            .filter_map(|h| h.category.as_deref())
            .collect();

        Self {
            quizzes_completed: history.len(),
            average_score: (average * 10.0).round() / 10.0,
            perfect_scores: history.iter().filter(|h| h.score == 100).count(),
            fastest_time: history.iter().map(|h| h.time_taken).min().unwrap_or(0),
            categories_explored: categories.len(),
        }
    }
}
