// src/services/http.rs

use std::collections::BTreeSet;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use url::Url;

use crate::{
    models::{
        attempt::{AttemptRecord, HistoryEntry, LeaderboardEntry, QuizAnalytics},
        quiz::{Quiz, QuizFilter, QuizSummary},
    },
    services::{AttemptLog, QuizCatalog, ServiceError},
    session::{SessionContext, error::SessionError},
};

#[derive(Deserialize)]
struct QuizList {
    quizzes: Vec<QuizSummary>,
}

#[derive(Deserialize)]
struct Categories {
    categories: Vec<String>,
}

#[derive(Deserialize)]
struct Leaderboard {
    leaderboard: Vec<LeaderboardEntry>,
}

#[derive(Deserialize)]
struct History {
    history: Vec<HistoryEntry>,
}

/// REST client for the backend API. Implements both collaborator traits.
///
/// No retries: a failed call is reported to the caller as-is.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ServiceError> {
        let mut base_url = Url::parse(base_url)?;
        // Url::join drops the last segment unless the path ends with '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder().build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ServiceError> {
        Ok(self.base_url.join(path)?)
    }

    fn authorized(&self, request: RequestBuilder, ctx: &SessionContext) -> RequestBuilder {
        match &ctx.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        ctx: &SessionContext,
        path: &str,
    ) -> Result<T, ServiceError> {
        let request = self.authorized(self.client.get(self.endpoint(path)?), ctx);
        let response = request.send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(ServiceError::NotFound(path.to_string())),
            status if !status.is_success() => Err(ServiceError::Status(status)),
            _ => Ok(response.json().await?),
        }
    }
}

#[async_trait]
impl QuizCatalog for ApiClient {
    async fn fetch_quiz(&self, ctx: &SessionContext, quiz_id: i64) -> Result<Quiz, SessionError> {
        self.get_json(ctx, &format!("quizzes/{}", quiz_id))
            .await
            .map_err(|e| match e {
                ServiceError::NotFound(_) => SessionError::NotFound(quiz_id),
                other => {
                    tracing::error!("Failed to fetch quiz {}: {}", quiz_id, other);
                    SessionError::Transport(other.to_string())
                }
            })
    }

    /// The backend's listing has no server-side filters, so they are
    /// applied here.
    async fn list_quizzes(
        &self,
        ctx: &SessionContext,
        filter: &QuizFilter,
    ) -> Result<Vec<QuizSummary>, ServiceError> {
        let list: QuizList = self.get_json(ctx, "quizzes").await?;

        Ok(list
            .quizzes
            .into_iter()
            .filter(|quiz| filter.matches(quiz))
            .collect())
    }

    /// The backend returns categories in set order.
    async fn categories(&self, ctx: &SessionContext) -> Result<Vec<String>, ServiceError> {
        let list: Categories = self.get_json(ctx, "categories").await?;
        let categories: BTreeSet<String> = list.categories.into_iter().collect();
        Ok(categories.into_iter().collect())
    }
}

#[async_trait]
impl AttemptLog for ApiClient {
    async fn record_attempt(
        &self,
        ctx: &SessionContext,
        record: &AttemptRecord,
    ) -> Result<(), ServiceError> {
        let request = self.authorized(
            self.client.post(self.endpoint("quiz-attempts")?).json(record),
            ctx,
        );
        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(ServiceError::Status(response.status()));
        }
        Ok(())
    }

    async fn leaderboard(&self, ctx: &SessionContext) -> Result<Vec<LeaderboardEntry>, ServiceError> {
        let board: Leaderboard = self.get_json(ctx, "leaderboard").await?;
        Ok(board.leaderboard)
    }

    async fn history(
        &self,
        ctx: &SessionContext,
        user_id: &str,
    ) -> Result<Vec<HistoryEntry>, ServiceError> {
        let mut path = self.endpoint("quiz-history/")?;
        path.path_segments_mut()
            .map_err(|_| ServiceError::Unavailable("Base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .push(user_id);

        let request = self.authorized(self.client.get(path), ctx);
        let response = request.send().await?;

        match response.status() {
            // No history yet.
            StatusCode::NOT_FOUND => Ok(Vec::new()),
            status if !status.is_success() => Err(ServiceError::Status(status)),
            _ => Ok(response.json::<History>().await?.history),
        }
    }

    async fn quiz_analytics(
        &self,
        ctx: &SessionContext,
        quiz_id: i64,
    ) -> Result<QuizAnalytics, ServiceError> {
        let mut analytics: QuizAnalytics = self
            .get_json(ctx, &format!("quiz-analytics/{}", quiz_id))
            .await?;
        analytics.quiz_id = quiz_id;
        Ok(analytics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_trailing_slash() {
        let client = ApiClient::new("http://localhost:8000/api").unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:8000/api/");
        assert_eq!(
            client.endpoint("quizzes/4").unwrap().as_str(),
            "http://localhost:8000/api/quizzes/4"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            ApiClient::new("not a url"),
            Err(ServiceError::Url(_))
        ));
    }
}
