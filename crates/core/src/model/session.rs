use chrono::{DateTime, Utc};
use std::collections::HashSet;
use thiserror::Error;

use crate::countdown::Countdown;
use crate::grader::grade_question;
use crate::model::ids::QuestionId;
use crate::model::question::Question;
use crate::model::result::{QuizResult, SubmitTrigger};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizSessionError {
    #[error("a quiz session needs at least one question")]
    Empty,

    #[error("question {0} was selected twice")]
    DuplicateQuestion(QuestionId),

    #[error("answer index {index} is out of range for {len} questions")]
    IndexOutOfRange { index: usize, len: usize },
}

/// One running quiz: a fixed question order, one answer slot per question,
/// a cursor, and a single countdown for the whole session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSession {
    questions: Vec<Question>,
    answers: Vec<String>,
    current: usize,
    countdown: Countdown,
    started_at: DateTime<Utc>,
}

impl QuizSession {
    /// Create a session over `questions` in the given order.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError::Empty` without questions and
    /// `QuizSessionError::DuplicateQuestion` if an id repeats.
    pub fn new(
        questions: Vec<Question>,
        seconds_per_question: u32,
        started_at: DateTime<Utc>,
    ) -> Result<Self, QuizSessionError> {
        if questions.is_empty() {
            return Err(QuizSessionError::Empty);
        }
        let mut seen = HashSet::with_capacity(questions.len());
        for question in &questions {
            if !seen.insert(question.id()) {
                return Err(QuizSessionError::DuplicateQuestion(question.id()));
            }
        }

        let countdown = Countdown::for_session(seconds_per_question, questions.len());
        Ok(Self {
            answers: vec![String::new(); questions.len()],
            questions,
            current: 0,
            countdown,
            started_at,
        })
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question_ids(&self) -> impl Iterator<Item = QuestionId> + '_ {
        self.questions.iter().map(Question::id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Always false; sessions are built from at least one question.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    #[must_use]
    pub fn answer(&self, index: usize) -> Option<&str> {
        self.answers.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        &self.questions[self.current]
    }

    #[must_use]
    pub fn current_answer(&self) -> &str {
        &self.answers[self.current]
    }

    #[must_use]
    pub fn is_first(&self) -> bool {
        self.current == 0
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.current + 1 == self.questions.len()
    }

    #[must_use]
    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Number of answer slots holding something other than whitespace.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| !a.trim().is_empty()).count()
    }

    /// Move to the next question, staying put on the last one.
    pub fn next(&mut self) -> usize {
        if !self.is_last() {
            self.current += 1;
        }
        self.current
    }

    /// Move to the previous question, staying put on the first one.
    pub fn previous(&mut self) -> usize {
        self.current = self.current.saturating_sub(1);
        self.current
    }

    /// Replace the stored answer at `index`.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError::IndexOutOfRange` if `index` is not a slot.
    pub fn update_answer(
        &mut self,
        index: usize,
        text: impl Into<String>,
    ) -> Result<(), QuizSessionError> {
        let len = self.answers.len();
        let slot = self
            .answers
            .get_mut(index)
            .ok_or(QuizSessionError::IndexOutOfRange { index, len })?;
        *slot = text.into();
        Ok(())
    }

    /// Consume one second of the session budget.
    pub fn tick(&mut self) -> u32 {
        self.countdown.tick()
    }

    /// Grade every answer and freeze the session into a result.
    #[must_use]
    pub fn into_result(self, trigger: SubmitTrigger, submitted_at: DateTime<Utc>) -> QuizResult {
        let scores = self
            .questions
            .iter()
            .zip(&self.answers)
            .map(|(question, answer)| grade_question(question, answer))
            .collect();

        QuizResult::new(
            self.started_at,
            submitted_at,
            trigger,
            self.countdown.remaining(),
            scores,
        )
    }
}
