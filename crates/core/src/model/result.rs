use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::ids::QuestionId;

/// What ended a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubmitTrigger {
    /// The learner pressed submit.
    Manual,
    /// The session countdown reached zero.
    Expired,
}

impl SubmitTrigger {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SubmitTrigger::Manual => "manual",
            SubmitTrigger::Expired => "expired",
        }
    }
}

impl fmt::Display for SubmitTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmitTrigger {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(SubmitTrigger::Manual),
            "expired" => Ok(SubmitTrigger::Expired),
            other => Err(format!("invalid submit trigger: {other}")),
        }
    }
}

/// Graded outcome for a single question of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionScore {
    pub question_id: QuestionId,
    pub topic: String,
    pub answer: String,
    pub score: u32,
    pub max_score: u32,
}

/// Immutable record of a submitted session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResult {
    started_at: DateTime<Utc>,
    submitted_at: DateTime<Utc>,
    trigger: SubmitTrigger,
    remaining_seconds: u32,
    scores: Vec<QuestionScore>,
}

impl QuizResult {
    #[must_use]
    pub fn new(
        started_at: DateTime<Utc>,
        submitted_at: DateTime<Utc>,
        trigger: SubmitTrigger,
        remaining_seconds: u32,
        scores: Vec<QuestionScore>,
    ) -> Self {
        Self {
            started_at,
            submitted_at,
            trigger,
            remaining_seconds,
            scores,
        }
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    #[must_use]
    pub fn trigger(&self) -> SubmitTrigger {
        self.trigger
    }

    #[must_use]
    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    #[must_use]
    pub fn scores(&self) -> &[QuestionScore] {
        &self.scores
    }

    pub fn question_ids(&self) -> impl Iterator<Item = QuestionId> + '_ {
        self.scores.iter().map(|s| s.question_id)
    }

    /// Sum of per-question scores.
    #[must_use]
    pub fn total_score(&self) -> u32 {
        self.scores
            .iter()
            .fold(0_u32, |acc, s| acc.saturating_add(s.score))
    }

    /// Sum of marking-point counts across the session's questions.
    #[must_use]
    pub fn max_score(&self) -> u32 {
        self.scores
            .iter()
            .fold(0_u32, |acc, s| acc.saturating_add(s.max_score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn totals_sum_question_scores() {
        let result = QuizResult::new(
            fixed_now(),
            fixed_now(),
            SubmitTrigger::Expired,
            0,
            vec![
                QuestionScore {
                    question_id: QuestionId::new(1),
                    topic: "Ecology".into(),
                    answer: "habitat changes".into(),
                    score: 2,
                    max_score: 3,
                },
                QuestionScore {
                    question_id: QuestionId::new(5),
                    topic: "Climate Change".into(),
                    answer: String::new(),
                    score: 0,
                    max_score: 1,
                },
            ],
        );
        assert_eq!(result.total_score(), 2);
        assert_eq!(result.max_score(), 4);
        assert_eq!(
            result.question_ids().collect::<Vec<_>>(),
            vec![QuestionId::new(1), QuestionId::new(5)]
        );
    }

    #[test]
    fn trigger_round_trips_through_str() {
        assert_eq!("expired".parse::<SubmitTrigger>(), Ok(SubmitTrigger::Expired));
        assert_eq!(SubmitTrigger::Manual.to_string(), "manual");
        assert!("timeout".parse::<SubmitTrigger>().is_err());
    }
}
