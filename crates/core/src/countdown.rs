/// A single countdown spanning a whole quiz session.
///
/// The budget is `seconds_per_question × questions` and is never reset
/// between questions. Remaining time only ever goes down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    total: u32,
    remaining: u32,
}

impl Countdown {
    /// Below this many seconds the session is considered short on time.
    pub const LOW_TIME_SECS: u32 = 30;

    #[must_use]
    pub fn for_session(seconds_per_question: u32, questions: usize) -> Self {
        let questions = u32::try_from(questions).unwrap_or(u32::MAX);
        Self::from_secs(seconds_per_question.saturating_mul(questions))
    }

    #[must_use]
    pub fn from_secs(total: u32) -> Self {
        Self {
            total,
            remaining: total,
        }
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub fn elapsed(&self) -> u32 {
        self.total.saturating_sub(self.remaining)
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.remaining == 0
    }

    #[must_use]
    pub fn is_running_low(&self) -> bool {
        self.remaining < Self::LOW_TIME_SECS
    }

    /// Consume one second and return what is left. Saturates at zero.
    pub fn tick(&mut self) -> u32 {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_spans_all_questions() {
        let countdown = Countdown::for_session(60, 3);
        assert_eq!(countdown.total(), 180);
        assert_eq!(countdown.remaining(), 180);
        assert!(!countdown.is_running_low());
    }

    #[test]
    fn elapsed_counts_up_as_time_runs_out() {
        let mut countdown = Countdown::for_session(10, 1);
        assert_eq!(countdown.elapsed(), 0);
        countdown.tick();
        countdown.tick();
        assert_eq!(countdown.elapsed(), 2);
        while !countdown.is_expired() {
            countdown.tick();
        }
        assert_eq!(countdown.elapsed(), 10);
    }

    #[test]
    fn tick_saturates_at_zero() {
        let mut countdown = Countdown::from_secs(2);
        assert_eq!(countdown.tick(), 1);
        assert_eq!(countdown.tick(), 0);
        assert!(countdown.is_expired());
        assert_eq!(countdown.tick(), 0);
        assert_eq!(countdown.elapsed(), 2);
    }

    #[test]
    fn flags_low_time() {
        let mut countdown = Countdown::from_secs(31);
        assert!(!countdown.is_running_low());
        countdown.tick();
        countdown.tick();
        assert!(countdown.is_running_low());
    }
}
