use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    config::Config,
    registry::SessionRegistry,
    services::{AttemptLog, QuizCatalog},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub catalog: Arc<dyn QuizCatalog>,
    pub attempt_log: Arc<dyn AttemptLog>,
    pub sessions: SessionRegistry,
}

impl AppState {
    pub fn new(
        config: Config,
        catalog: Arc<dyn QuizCatalog>,
        attempt_log: Arc<dyn AttemptLog>,
    ) -> Self {
        Self {
            config,
            catalog,
            attempt_log,
            sessions: SessionRegistry::default(),
        }
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for SessionRegistry {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}
