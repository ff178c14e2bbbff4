use serde::Serialize;
use thiserror::Error;

use crate::session::Phase;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Quiz {0} not found")]
    NotFound(i64),

    #[error("Quiz catalog unavailable: {0}")]
    Transport(String),

    #[error("Quiz cannot be attempted: {0}")]
    Configuration(String),

    #[error("Session is {actual:?}, expected {expected:?}")]
    InvalidPhase { expected: Phase, actual: Phase },

    #[error("Question {0} is not part of this quiz")]
    UnknownQuestion(i64),
}

/// The attempt was scored but the attempt log did not record it.
/// Never affects the result shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("Attempt was scored but could not be recorded: {message}")]
pub struct PersistenceWarning {
    pub message: String,
}
