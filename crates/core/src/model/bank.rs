use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::question::Question;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BankError {
    #[error("question id {0} appears more than once in the bank")]
    DuplicateId(QuestionId),
}

/// Read-only, ordered collection of questions with unique ids.
///
/// The bank is fixed once built; the quiz engine only ever borrows from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Build a bank, rejecting duplicate ids.
    ///
    /// # Errors
    ///
    /// Returns `BankError::DuplicateId` for the first repeated id.
    pub fn new(questions: Vec<Question>) -> Result<Self, BankError> {
        let mut seen = HashSet::with_capacity(questions.len());
        for question in &questions {
            if !seen.insert(question.id()) {
                return Err(BankError::DuplicateId(question.id()));
            }
        }
        Ok(Self { questions })
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = QuestionId> + '_ {
        self.questions.iter().map(Question::id)
    }

    /// True when every question in the bank appears in `solved`.
    ///
    /// An empty bank is never considered covered.
    #[must_use]
    pub fn is_covered_by<F>(&self, mut is_solved: F) -> bool
    where
        F: FnMut(QuestionId) -> bool,
    {
        !self.is_empty() && self.ids().all(|id| is_solved(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Difficulty, KeywordGroup};
    use std::collections::BTreeSet;

    fn question(id: u64) -> Question {
        Question::new(
            QuestionId::new(id),
            "Topic",
            Difficulty::Easy,
            format!("Q{id}"),
            format!("A{id}"),
            vec![KeywordGroup::new(["a"])],
        )
        .unwrap()
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = QuestionBank::new(vec![question(1), question(2), question(1)]).unwrap_err();
        assert_eq!(err, BankError::DuplicateId(QuestionId::new(1)));
    }

    #[test]
    fn coverage_requires_every_id() {
        let bank = QuestionBank::new(vec![question(1), question(2)]).unwrap();
        let partial: BTreeSet<_> = [QuestionId::new(1)].into();
        let full: BTreeSet<_> = [QuestionId::new(1), QuestionId::new(2), QuestionId::new(9)].into();

        assert!(!bank.is_covered_by(|id| partial.contains(&id)));
        assert!(bank.is_covered_by(|id| full.contains(&id)));
        assert!(!QuestionBank::empty().is_covered_by(|_| true));
    }
}
