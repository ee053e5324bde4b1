//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{ConfigError, QuizSessionError};
use storage::repository::StorageError;

use crate::sessions::QuizStatus;

/// Errors emitted by the quiz engine and its companion services.
///
/// Running out of questions is not an error; it is reported through
/// `QuizStatus::AllSolved` and `QuizStatus::NoQuestionsAvailable`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no active quiz session (quiz is {status})")]
    NotActive { status: QuizStatus },
    #[error("cannot {action} while quiz is {status}")]
    InvalidTransition {
        action: &'static str,
        status: QuizStatus,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Session(#[from] QuizSessionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
