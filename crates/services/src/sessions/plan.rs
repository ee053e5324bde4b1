use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::BTreeSet;

use quiz_core::model::{Question, QuestionBank, QuestionId, SessionConfig};

/// Outcome of drawing questions for a new session.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Questions in the order the session will present them.
    Selected(Vec<Question>),
    /// Every bank question is already in the solved set.
    AllSolved,
    /// The bank itself has no questions.
    NoQuestionsAvailable,
}

/// Draws unseen questions from a bank.
pub struct QuestionSelector<'a> {
    bank: &'a QuestionBank,
    session_size: usize,
}

impl<'a> QuestionSelector<'a> {
    #[must_use]
    pub fn new(bank: &'a QuestionBank) -> Self {
        Self {
            bank,
            session_size: usize::try_from(SessionConfig::DEFAULT_SESSION_SIZE).unwrap_or(1),
        }
    }

    /// Maximum number of questions to draw (K).
    #[must_use]
    pub fn with_session_size(mut self, session_size: u32) -> Self {
        self.session_size = usize::try_from(session_size).unwrap_or(usize::MAX);
        self
    }

    /// Pick up to K questions whose ids are not in `solved`.
    ///
    /// Candidates are shuffled with `rng` (Fisher–Yates) before taking the
    /// first K, so every subset and order is equally likely.
    pub fn select<R: Rng + ?Sized>(&self, solved: &BTreeSet<QuestionId>, rng: &mut R) -> Selection {
        if self.bank.is_empty() {
            return Selection::NoQuestionsAvailable;
        }

        let mut available: Vec<&Question> = self
            .bank
            .questions()
            .iter()
            .filter(|q| !solved.contains(&q.id()))
            .collect();
        if available.is_empty() {
            return Selection::AllSolved;
        }

        available.shuffle(rng);
        available.truncate(self.session_size);
        Selection::Selected(available.into_iter().cloned().collect())
    }
}
