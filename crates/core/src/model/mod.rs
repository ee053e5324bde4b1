mod bank;
mod config;
mod ids;
mod question;
mod result;
mod session;

pub use ids::{ParseIdError, QuestionId};

pub use bank::{BankError, QuestionBank};
pub use config::{ConfigError, SessionConfig};
pub use question::{Difficulty, KeywordGroup, Question, QuestionError};
pub use result::{QuestionScore, QuizResult, SubmitTrigger};
pub use session::{QuizSession, QuizSessionError};
