mod engine;
mod history;
mod plan;
mod ticker;

// Public API of the quiz session subsystem.
pub use crate::error::SessionError;
pub use engine::{QuizEngine, QuizStatus, TickOutcome};
pub use history::{QuizHistoryService, QuizHistoryTotals, QuizResultId, QuizResultListItem};
pub use plan::{QuestionSelector, Selection};
