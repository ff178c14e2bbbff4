// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{profile, quiz, session},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Public: quiz browsing, categories, per-quiz analytics and the leaderboard.
/// * Protected (bearer token): quiz sessions, the user's history and stats, bundle validation.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let session_routes = Router::new()
        .route("/", post(session::create_session))
        .route(
            "/{id}",
            get(session::get_session).delete(session::discard_session),
        )
        .route("/{id}/start", post(session::start_session))
        .route("/{id}/answers", post(session::record_answer))
        .route("/{id}/next", post(session::next_question))
        .route("/{id}/previous", post(session::previous_question))
        .route("/{id}/submit", post(session::submit_session))
        .layer(auth.clone());

    let me_routes = Router::new()
        .route("/history", get(profile::get_my_history))
        .route("/stats", get(profile::get_my_stats))
        .layer(auth.clone());

    let bundle_routes = Router::new()
        .route("/validate", post(quiz::validate_bundle))
        .layer(auth);

    Router::new()
        .route("/api/quizzes", get(quiz::list_quizzes))
        .route("/api/quizzes/{id}/analytics", get(quiz::get_quiz_analytics))
        .route("/api/categories", get(quiz::list_categories))
        .route("/api/leaderboard", get(quiz::get_leaderboard))
        .nest("/api/sessions", session_routes)
        .nest("/api/me", me_routes)
        .nest("/api/bundles", bundle_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::{
        config::Config,
        services::memory::{InMemoryAttemptLog, InMemoryCatalog},
        utils::jwt::sign_jwt,
    };

    fn app() -> Router {
        let config = Config {
            api_base_url: "http://127.0.0.1:1/".to_string(),
            jwt_secret: "router_test_secret".to_string(),
            rust_log: "error".to_string(),
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            allowed_origins: vec!["http://localhost:3000".to_string()],
        };
        let state = AppState::new(
            config,
            Arc::new(InMemoryCatalog::default()),
            Arc::new(InMemoryAttemptLog::default()),
        );
        create_router(state)
    }

    #[tokio::test]
    async fn protected_routes_reject_missing_token() {
        let response = app()
            .oneshot(Request::builder().uri("/api/me/stats").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn protected_routes_accept_valid_token() {
        let token = sign_jwt("alice", "router_test_secret", 60).unwrap();
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/api/me/stats")
                    .header("authorization", format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn public_routes_need_no_token() {
        let response = app()
            .oneshot(Request::builder().uri("/api/quizzes").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
