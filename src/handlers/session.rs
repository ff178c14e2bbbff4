// src/handlers/session.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::quiz::AnswerValue,
    session::{QuizSession, SessionContext, SessionView},
    state::AppState,
};

/// DTO for opening a quiz attempt.
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub quiz_id: i64,
}

/// DTO for recording an answer.
/// `answer` is an option index (number) or free text (string).
#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub question_id: i64,
    pub answer: AnswerValue,
}

#[derive(Debug, Serialize)]
pub struct SessionCreated {
    pub session_id: Uuid,
    pub session: SessionView,
}

fn find_session(state: &AppState, ctx: &SessionContext, id: Uuid) -> Result<QuizSession, AppError> {
    state
        .sessions
        .get(id, &ctx.user_id)
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))
}

/// Opens a new attempt for the current user.
///
/// * Loads the quiz from the catalog (404 if unknown, 400 if it has no questions).
/// * Discards any previous session of the same user.
/// * The session starts in `not_started`; the countdown begins on `start`.
pub async fn create_session(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = QuizSession::load(
        state.catalog.as_ref(),
        state.attempt_log.clone(),
        ctx,
        req.quiz_id,
    )
    .await?;

    let view = session.snapshot();
    let session_id = state.sessions.insert(session);

    Ok((
        StatusCode::CREATED,
        Json(SessionCreated {
            session_id,
            session: view,
        }),
    ))
}

pub async fn get_session(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = find_session(&state, &ctx, id)?;
    Ok(Json(session.snapshot()))
}

/// Starts the countdown. Repeated calls are harmless.
pub async fn start_session(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = find_session(&state, &ctx, id)?;
    session.start();
    Ok(Json(session.snapshot()))
}

/// Records or replaces the answer to one question. 409 unless running.
pub async fn record_answer(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<AnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = find_session(&state, &ctx, id)?;
    session.record_answer(req.question_id, req.answer)?;
    Ok(Json(session.snapshot()))
}

pub async fn next_question(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = find_session(&state, &ctx, id)?;
    session.go_to_next();
    Ok(Json(session.snapshot()))
}

pub async fn previous_question(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = find_session(&state, &ctx, id)?;
    session.go_to_previous();
    Ok(Json(session.snapshot()))
}

/// Submits the attempt and returns the scored result.
///
/// * A failure to record the attempt is reported in `warning`; the score stands.
/// * Submitting again returns the same result.
pub async fn submit_session(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = find_session(&state, &ctx, id)?;
    let submission = session.submit().await?;
    Ok(Json(submission))
}

/// Leaves the attempt. An unsubmitted session is abandoned, never auto-submitted.
pub async fn discard_session(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = state
        .sessions
        .remove(id, &ctx.user_id)
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;
    session.discard();
    Ok(StatusCode::NO_CONTENT)
}
