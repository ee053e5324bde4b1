#![forbid(unsafe_code)]

pub mod error;
pub mod sessions;

pub use quiz_core::Clock;

pub use error::SessionError;
pub use sessions::{
    QuestionSelector, QuizEngine, QuizHistoryService, QuizHistoryTotals, QuizResultId,
    QuizResultListItem, QuizStatus, Selection, TickOutcome,
};
