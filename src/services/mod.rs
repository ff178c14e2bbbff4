// src/services/mod.rs

//! Contracts for the external collaborators: the quiz catalog and the
//! attempt log. The session only talks to these traits.

pub mod http;
pub mod memory;

use std::collections::BTreeSet;

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    models::{
        attempt::{AttemptRecord, HistoryEntry, LeaderboardEntry, QuizAnalytics},
        quiz::{Quiz, QuizFilter, QuizSummary},
    },
    session::{SessionContext, error::SessionError},
};

pub use http::ApiClient;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Request failed: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Invalid service URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Service responded with status {0}")]
    Status(reqwest::StatusCode),

    #[error("{0}")]
    Unavailable(String),
}

/// Supplies quiz content, answer key included.
#[async_trait]
pub trait QuizCatalog: Send + Sync {
    async fn fetch_quiz(&self, ctx: &SessionContext, quiz_id: i64) -> Result<Quiz, SessionError>;

    async fn list_quizzes(
        &self,
        ctx: &SessionContext,
        filter: &QuizFilter,
    ) -> Result<Vec<QuizSummary>, ServiceError>;

    /// Distinct categories, sorted. Derived from the full listing unless the
    /// catalog serves them directly.
    async fn categories(&self, ctx: &SessionContext) -> Result<Vec<String>, ServiceError> {
        let quizzes = self.list_quizzes(ctx, &QuizFilter::default()).await?;
        let categories: BTreeSet<String> = quizzes.into_iter().map(|q| q.category).collect();
        Ok(categories.into_iter().collect())
    }
}

/// Persists results and serves the aggregates built from them.
#[async_trait]
pub trait AttemptLog: Send + Sync {
    async fn record_attempt(
        &self,
        ctx: &SessionContext,
        record: &AttemptRecord,
    ) -> Result<(), ServiceError>;

    async fn leaderboard(&self, ctx: &SessionContext) -> Result<Vec<LeaderboardEntry>, ServiceError>;

    async fn history(
        &self,
        ctx: &SessionContext,
        user_id: &str,
    ) -> Result<Vec<HistoryEntry>, ServiceError>;

    async fn quiz_analytics(
        &self,
        ctx: &SessionContext,
        quiz_id: i64,
    ) -> Result<QuizAnalytics, ServiceError>;
}
