use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rand::RngCore;
use rand::SeedableRng;
use rand::rngs::StdRng;

use quiz_core::Clock;
use quiz_core::model::{
    QuestionBank, QuestionId, QuizResult, QuizSession, SessionConfig, SubmitTrigger,
};
use storage::repository::{QuizResultRepository, SolvedSetStore};

use super::plan::{QuestionSelector, Selection};
use super::ticker::CountdownTicker;
use crate::error::SessionError;

/// Observable state of the quiz engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuizStatus {
    Idle,
    Selecting,
    Active,
    Submitted,
    AllSolved,
    NoQuestionsAvailable,
}

impl fmt::Display for QuizStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            QuizStatus::Idle => "idle",
            QuizStatus::Selecting => "selecting",
            QuizStatus::Active => "active",
            QuizStatus::Submitted => "submitted",
            QuizStatus::AllSolved => "all solved",
            QuizStatus::NoQuestionsAvailable => "without questions",
        };
        f.write_str(label)
    }
}

/// Result of applying one second to a running session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Running { remaining: u32 },
    Expired(QuizResult),
}

enum Phase {
    Idle,
    Selecting,
    Active(QuizSession),
    Submitted(QuizResult),
    AllSolved,
    NoQuestionsAvailable,
}

impl Phase {
    fn status(&self) -> QuizStatus {
        match self {
            Phase::Idle => QuizStatus::Idle,
            Phase::Selecting => QuizStatus::Selecting,
            Phase::Active(_) => QuizStatus::Active,
            Phase::Submitted(_) => QuizStatus::Submitted,
            Phase::AllSolved => QuizStatus::AllSolved,
            Phase::NoQuestionsAvailable => QuizStatus::NoQuestionsAvailable,
        }
    }
}

/// Quiz session state machine.
///
/// Owns the question bank, at most one session, and the countdown ticker of
/// that session. Solved-question progress lives in a `SolvedSetStore`; when
/// the store fails, ids are kept in memory and merged by the next
/// `flush_progress`.
pub struct QuizEngine {
    bank: QuestionBank,
    solved_store: Arc<dyn SolvedSetStore>,
    results: Option<Arc<dyn QuizResultRepository>>,
    rng: Box<dyn RngCore + Send>,
    clock: Clock,
    tick_period: Option<Duration>,
    phase: Phase,
    ticker: Option<CountdownTicker>,
    known_solved: BTreeSet<QuestionId>,
    pending_solved: BTreeSet<QuestionId>,
    bank_exhausted: bool,
    last_result_id: Option<i64>,
    unrecorded: Option<QuizResult>,
}

impl QuizEngine {
    pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

    #[must_use]
    pub fn new(bank: QuestionBank, solved_store: Arc<dyn SolvedSetStore>) -> Self {
        Self {
            bank,
            solved_store,
            results: None,
            rng: Box::new(StdRng::from_os_rng()),
            clock: Clock::default(),
            tick_period: Some(Self::DEFAULT_TICK_PERIOD),
            phase: Phase::Idle,
            ticker: None,
            known_solved: BTreeSet::new(),
            pending_solved: BTreeSet::new(),
            bank_exhausted: false,
            last_result_id: None,
            unrecorded: None,
        }
    }

    /// Use `rng` for question sampling.
    #[must_use]
    pub fn with_rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Append every submitted result to `results`.
    #[must_use]
    pub fn with_results(mut self, results: Arc<dyn QuizResultRepository>) -> Self {
        self.results = Some(results);
        self
    }

    /// Interval between automatic countdown ticks; `None` leaves ticking to
    /// explicit `tick()` calls.
    #[must_use]
    pub fn with_tick_period(mut self, period: Option<Duration>) -> Self {
        self.tick_period = period;
        self
    }

    #[must_use]
    pub fn status(&self) -> QuizStatus {
        self.phase.status()
    }

    #[must_use]
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    /// The running session, if any.
    #[must_use]
    pub fn session(&self) -> Option<&QuizSession> {
        match &self.phase {
            Phase::Active(session) => Some(session),
            _ => None,
        }
    }

    /// The graded result while the engine is `Submitted`.
    #[must_use]
    pub fn result(&self) -> Option<&QuizResult> {
        match &self.phase {
            Phase::Submitted(result) => Some(result),
            _ => None,
        }
    }

    /// True once the solved set covers the whole bank; the next `start()`
    /// will report `AllSolved`.
    #[must_use]
    pub fn bank_exhausted(&self) -> bool {
        self.bank_exhausted
    }

    /// Ids solved in this process that have not reached the store yet.
    #[must_use]
    pub fn pending_solved(&self) -> &BTreeSet<QuestionId> {
        &self.pending_solved
    }

    /// Storage id of the most recently persisted result.
    #[must_use]
    pub fn last_result_id(&self) -> Option<i64> {
        self.last_result_id
    }

    /// Move an idle engine to `AllSolved` when stored progress already covers
    /// the bank. Other states are left untouched.
    pub async fn check_progress(&mut self) -> QuizStatus {
        self.flush_progress().await;
        if matches!(self.phase, Phase::Idle) {
            let solved = self.load_solved().await;
            if self.bank.is_covered_by(|id| solved.contains(&id)) {
                self.bank_exhausted = true;
                self.phase = Phase::AllSolved;
            }
        }
        self.status()
    }

    /// Draw a fresh session.
    ///
    /// A running session is abandoned without grading. Running out of
    /// questions is reported through the returned status, not as an error.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Config` for an invalid configuration and
    /// `SessionError::InvalidTransition` when the bank has no questions at all.
    pub async fn start(&mut self, config: SessionConfig) -> Result<QuizStatus, SessionError> {
        let config = config.validate()?;
        match self.phase {
            Phase::NoQuestionsAvailable => {
                return Err(SessionError::InvalidTransition {
                    action: "start",
                    status: QuizStatus::NoQuestionsAvailable,
                });
            }
            Phase::Active(_) => tracing::info!("abandoning running quiz session"),
            _ => {}
        }

        self.ticker = None;
        self.flush_progress().await;
        self.phase = Phase::Selecting;
        let solved = self.load_solved().await;

        let selection = QuestionSelector::new(&self.bank)
            .with_session_size(config.session_size())
            .select(&solved, &mut *self.rng);

        self.phase = match selection {
            Selection::Selected(questions) => {
                let session =
                    QuizSession::new(questions, config.seconds_per_question(), self.clock.now())?;
                tracing::info!(
                    questions = session.len(),
                    seconds = session.countdown().total(),
                    "quiz session started"
                );
                self.bank_exhausted = false;
                self.ticker = self.tick_period.and_then(CountdownTicker::spawn);
                Phase::Active(session)
            }
            Selection::AllSolved => {
                tracing::info!(bank = self.bank.len(), "every question already solved");
                self.bank_exhausted = true;
                Phase::AllSolved
            }
            Selection::NoQuestionsAvailable => {
                tracing::warn!("question bank is empty");
                Phase::NoQuestionsAvailable
            }
        };
        Ok(self.status())
    }

    /// Move to the next question; stays on the last one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` outside an active session.
    pub fn next(&mut self) -> Result<usize, SessionError> {
        Ok(self.active_session_mut()?.next())
    }

    /// Move to the previous question; stays on the first one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` outside an active session.
    pub fn previous(&mut self) -> Result<usize, SessionError> {
        Ok(self.active_session_mut()?.previous())
    }

    /// Overwrite the answer stored for question `index`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` outside an active session and
    /// `SessionError::Session` for an index outside the session.
    pub fn update_answer(
        &mut self,
        index: usize,
        text: impl Into<String>,
    ) -> Result<(), SessionError> {
        self.active_session_mut()?.update_answer(index, text)?;
        Ok(())
    }

    /// Grade the running session and record its questions as solved.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` outside an active session. Storage
    /// failures are logged and retried by the next `flush_progress`.
    pub async fn submit(&mut self) -> Result<QuizResult, SessionError> {
        let result = self.finish(SubmitTrigger::Manual)?;
        self.flush_progress().await;
        Ok(result)
    }

    /// Consume one second of the session budget, submitting at zero.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` outside an active session.
    pub async fn tick(&mut self) -> Result<TickOutcome, SessionError> {
        let outcome = self.apply_tick()?;
        if matches!(outcome, TickOutcome::Expired(_)) {
            self.flush_progress().await;
        }
        Ok(outcome)
    }

    /// Wait for the ticker and apply one second.
    ///
    /// Pends forever while no ticker is running, so it can sit in a
    /// `tokio::select!` next to user input. Cancel-safe: the only await is
    /// the pulse itself, and on expiry the session is graded and `Submitted`
    /// before this returns. Nothing is written to storage here; follow an
    /// `Expired` outcome with `flush_progress` (the next `start` also does).
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` outside an active session.
    pub async fn next_tick(&mut self) -> Result<TickOutcome, SessionError> {
        let pulsed = match self.ticker.as_mut() {
            Some(ticker) => ticker.pulse().await.is_some(),
            None => false,
        };
        if !pulsed {
            self.ticker = None;
            return std::future::pending().await;
        }
        self.apply_tick()
    }

    /// Write queued solved ids and the last unrecorded result.
    ///
    /// Safe to cancel and to call repeatedly: whatever has not reached the
    /// stores stays queued for the next call. Failures are logged.
    pub async fn flush_progress(&mut self) {
        self.consolidate_solved().await;
        self.record_result().await;
    }

    /// Drop the running session without grading it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` outside an active session.
    pub fn abandon(&mut self) -> Result<(), SessionError> {
        self.active_session_mut()?;
        self.ticker = None;
        self.phase = Phase::Idle;
        tracing::info!("quiz session abandoned");
        Ok(())
    }

    /// Forget all solved progress after the bank has been exhausted.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless the engine is
    /// `AllSolved`, and `SessionError::Storage` if the store cannot be
    /// cleared (the engine then stays `AllSolved`).
    pub async fn reset(&mut self) -> Result<QuizStatus, SessionError> {
        if !matches!(self.phase, Phase::AllSolved) {
            return Err(SessionError::InvalidTransition {
                action: "reset",
                status: self.status(),
            });
        }
        self.record_result().await;
        self.solved_store.clear().await?;
        self.known_solved.clear();
        self.pending_solved.clear();
        self.bank_exhausted = false;
        self.phase = Phase::Idle;
        tracing::info!("solved progress reset");
        Ok(self.status())
    }

    fn active_session_mut(&mut self) -> Result<&mut QuizSession, SessionError> {
        let status = self.phase.status();
        match &mut self.phase {
            Phase::Active(session) => Ok(session),
            _ => Err(SessionError::NotActive { status }),
        }
    }

    fn apply_tick(&mut self) -> Result<TickOutcome, SessionError> {
        let remaining = self.active_session_mut()?.tick();
        if remaining > 0 {
            return Ok(TickOutcome::Running { remaining });
        }
        tracing::info!("quiz countdown expired");
        Ok(TickOutcome::Expired(self.finish(SubmitTrigger::Expired)?))
    }

    /// Single exit from `Active` for both manual submit and expiry.
    ///
    /// Grades and queues the session ids and result for `flush_progress`
    /// without awaiting, so the transition cannot be cut in half.
    fn finish(&mut self, trigger: SubmitTrigger) -> Result<QuizResult, SessionError> {
        let session = match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Active(session) => session,
            other => {
                let status = other.status();
                self.phase = other;
                return Err(SessionError::NotActive { status });
            }
        };
        self.ticker = None;

        let result = session.into_result(trigger, self.clock.now());
        self.pending_solved.extend(result.question_ids());
        self.bank_exhausted = self.covers_bank();
        if self.results.is_some() {
            self.unrecorded = Some(result.clone());
        }
        self.phase = Phase::Submitted(result.clone());
        tracing::info!(
            %trigger,
            score = result.total_score(),
            max = result.max_score(),
            "quiz submitted"
        );
        Ok(result)
    }

    fn covers_bank(&self) -> bool {
        self.bank.is_covered_by(|id| {
            self.known_solved.contains(&id) || self.pending_solved.contains(&id)
        })
    }

    /// Stored solved set (or the last known copy if the store is unreadable)
    /// plus ids still waiting to be written.
    async fn load_solved(&mut self) -> BTreeSet<QuestionId> {
        match self.solved_store.get().await {
            Ok(ids) => self.known_solved = ids,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read solved set; using last known progress");
            }
        }
        self.known_solved
            .union(&self.pending_solved)
            .copied()
            .collect()
    }

    /// Read-merge-write of pending ids into the store.
    async fn consolidate_solved(&mut self) {
        if self.pending_solved.is_empty() {
            return;
        }
        let mut merged = match self.solved_store.get().await {
            Ok(ids) => ids,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    pending = self.pending_solved.len(),
                    "failed to read solved set; will retry"
                );
                return;
            }
        };
        merged.extend(self.pending_solved.iter().copied());

        match self.solved_store.set(&merged).await {
            Ok(()) => {
                tracing::debug!(solved = merged.len(), "solved set updated");
                self.known_solved = merged;
                self.pending_solved.clear();
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    pending = self.pending_solved.len(),
                    "failed to write solved set; will retry"
                );
            }
        }
    }

    /// Append the queued result to history. The result stays queued if this
    /// is cancelled mid-write; a failed write is logged and dropped.
    async fn record_result(&mut self) {
        let (Some(results), Some(result)) = (self.results.clone(), self.unrecorded.as_ref()) else {
            return;
        };
        match results.append_result(result).await {
            Ok(id) => self.last_result_id = Some(id),
            Err(err) => tracing::warn!(error = %err, "failed to store quiz result"),
        }
        self.unrecorded = None;
    }
}
