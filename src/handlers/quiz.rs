// src/handlers/quiz.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::{bundle::QuizBundle, quiz::QuizFilter},
    session::SessionContext,
    state::AppState,
};

/// Lists quizzes, optionally filtered by category, difficulty and a search term.
pub async fn list_quizzes(
    State(state): State<AppState>,
    Query(filter): Query<QuizFilter>,
) -> Result<impl IntoResponse, AppError> {
    let quizzes = state
        .catalog
        .list_quizzes(&SessionContext::anonymous(), &filter)
        .await?;

    Ok(Json(quizzes))
}

/// Distinct quiz categories for the browse filters.
pub async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let categories = state
        .catalog
        .categories(&SessionContext::anonymous())
        .await?;

    Ok(Json(categories))
}

/// Attempt statistics for one quiz.
pub async fn get_quiz_analytics(
    State(state): State<AppState>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let analytics = state
        .attempt_log
        .quiz_analytics(&SessionContext::anonymous(), quiz_id)
        .await?;

    Ok(Json(analytics))
}

/// Retrieves the leaderboard from the attempt log.
pub async fn get_leaderboard(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let leaderboard = state
        .attempt_log
        .leaderboard(&SessionContext::anonymous())
        .await?;

    Ok(Json(leaderboard))
}

/// Checks an import bundle and returns what it would create.
pub async fn validate_bundle(Json(bundle): Json<QuizBundle>) -> Result<impl IntoResponse, AppError> {
    bundle.validate()?;
    Ok(Json(bundle.summary()))
}
