use axum::{Extension, Json, extract::State, response::IntoResponse};

use crate::{
    error::AppError, models::attempt::UserStats, session::SessionContext, state::AppState,
};

/// Past attempts of the current user.
pub async fn get_my_history(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
) -> Result<impl IntoResponse, AppError> {
    let history = state.attempt_log.history(&ctx, &ctx.user_id).await?;
    Ok(Json(history))
}

/// Get current user's statistics, derived from their history.
pub async fn get_my_stats(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
) -> Result<impl IntoResponse, AppError> {
    let history = state.attempt_log.history(&ctx, &ctx.user_id).await?;
    Ok(Json(UserStats::from_history(&history)))
}
