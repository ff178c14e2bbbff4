// src/services/memory.rs

use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;

use crate::{
    models::{
        attempt::{AttemptRecord, HistoryEntry, LeaderboardEntry, QuizAnalytics},
        quiz::{Quiz, QuizFilter, QuizSummary},
    },
    services::{AttemptLog, QuizCatalog, ServiceError},
    session::{SessionContext, error::SessionError},
};

/// Catalog backed by a fixed set of quizzes.
#[derive(Default)]
pub struct InMemoryCatalog {
    quizzes: HashMap<i64, Quiz>,
    offline: AtomicBool,
}

impl InMemoryCatalog {
    pub fn new(quizzes: impl IntoIterator<Item = Quiz>) -> Self {
        Self {
            quizzes: quizzes.into_iter().map(|q| (q.id, q)).collect(),
            offline: AtomicBool::new(false),
        }
    }

    /// Simulates an unreachable catalog.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait]
impl QuizCatalog for InMemoryCatalog {
    async fn fetch_quiz(&self, _ctx: &SessionContext, quiz_id: i64) -> Result<Quiz, SessionError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(SessionError::Transport("catalog offline".to_string()));
        }
        self.quizzes
            .get(&quiz_id)
            .cloned()
            .ok_or(SessionError::NotFound(quiz_id))
    }

    async fn list_quizzes(
        &self,
        _ctx: &SessionContext,
        filter: &QuizFilter,
    ) -> Result<Vec<QuizSummary>, ServiceError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ServiceError::Unavailable("catalog offline".to_string()));
        }
        let mut quizzes: Vec<QuizSummary> = self
            .quizzes
            .values()
            .map(Quiz::summary)
            .filter(|q| filter.matches(q))
            .collect();
        quizzes.sort_by_key(|q| q.id);
        Ok(quizzes)
    }
}

/// Attempt log that keeps every record in memory and derives the
/// leaderboard, history and analytics from them.
#[derive(Default)]
pub struct InMemoryAttemptLog {
    records: Mutex<Vec<AttemptRecord>>,
    quizzes: HashMap<i64, Quiz>,
    failing: AtomicBool,
}

impl InMemoryAttemptLog {
    /// `quizzes` provides titles and categories for history entries and the
    /// question list for analytics.
    pub fn new<'a>(quizzes: impl IntoIterator<Item = &'a Quiz>) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            quizzes: quizzes.into_iter().map(|q| (q.id, q.clone())).collect(),
            failing: AtomicBool::new(false),
        }
    }

    /// Makes every `record_attempt` call fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn records(&self) -> Vec<AttemptRecord> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl AttemptLog for InMemoryAttemptLog {
    async fn record_attempt(
        &self,
        _ctx: &SessionContext,
        record: &AttemptRecord,
    ) -> Result<(), ServiceError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ServiceError::Unavailable("attempt log offline".to_string()));
        }
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record.clone());
        Ok(())
    }

    async fn leaderboard(&self, _ctx: &SessionContext) -> Result<Vec<LeaderboardEntry>, ServiceError> {
        let mut totals: HashMap<String, (i64, i64)> = HashMap::new();
        for record in self.records() {
            let entry = totals.entry(record.user_id).or_default();
            entry.0 += i64::from(record.score);
            entry.1 += 1;
        }

        let mut board: Vec<LeaderboardEntry> = totals
            .into_iter()
            .map(|(username, (total_score, quizzes_taken))| LeaderboardEntry {
                username,
                total_score,
                quizzes_taken,
                average_score: ((total_score as f64 / quizzes_taken as f64) * 10.0).round() / 10.0,
            })
            .collect();
        board.sort_by(|a, b| {
            b.total_score
                .cmp(&a.total_score)
                .then_with(|| a.username.cmp(&b.username))
        });
        Ok(board)
    }

    async fn history(
        &self,
        _ctx: &SessionContext,
        user_id: &str,
    ) -> Result<Vec<HistoryEntry>, ServiceError> {
        Ok(self
            .records()
            .into_iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| {
                let (quiz_title, category) = self
                    .quizzes
                    .get(&r.quiz_id)
                    .map(|q| (q.title.clone(), Some(q.category.clone())))
                    .unwrap_or_else(|| (format!("Quiz {}", r.quiz_id), None));
                HistoryEntry {
                    quiz_id: r.quiz_id,
                    quiz_title,
                    category,
                    score: r.score,
                    total_questions: r.total_questions,
                    time_taken: r.time_taken,
                    completed_at: r.completed_at,
                }
            })
            .collect())
    }

    async fn quiz_analytics(
        &self,
        _ctx: &SessionContext,
        quiz_id: i64,
    ) -> Result<QuizAnalytics, ServiceError> {
        let quiz = self
            .quizzes
            .get(&quiz_id)
            .ok_or_else(|| ServiceError::NotFound(format!("quiz {}", quiz_id)))?;
        Ok(QuizAnalytics::from_attempts(quiz, &self.records()))
    }
}
