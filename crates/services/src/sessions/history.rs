use chrono::{DateTime, Utc};
use std::sync::Arc;

use quiz_core::model::{QuizResult, SubmitTrigger};
use storage::repository::{QuizResultRepository, QuizResultRow};

use crate::error::SessionError;

/// Storage identifier for a persisted quiz result.
pub type QuizResultId = i64;

/// Presentation-agnostic list item for a past quiz.
///
/// Carries no pre-formatted strings; callers format timestamps and scores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizResultListItem {
    pub id: QuizResultId,
    pub submitted_at: DateTime<Utc>,
    pub trigger: SubmitTrigger,
    pub questions: usize,
    pub score: u32,
    pub max_score: u32,
    pub remaining_seconds: u32,
}

impl QuizResultListItem {
    #[must_use]
    pub fn from_row(row: &QuizResultRow) -> Self {
        let result = &row.result;
        Self {
            id: row.id,
            submitted_at: result.submitted_at(),
            trigger: result.trigger(),
            questions: result.scores().len(),
            score: result.total_score(),
            max_score: result.max_score(),
            remaining_seconds: result.remaining_seconds(),
        }
    }
}

/// Aggregate over a window of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuizHistoryTotals {
    pub sessions: usize,
    pub score: u32,
    pub max_score: u32,
    pub expired: usize,
}

/// Read side of quiz result history.
#[derive(Clone)]
pub struct QuizHistoryService {
    results: Arc<dyn QuizResultRepository>,
}

impl QuizHistoryService {
    #[must_use]
    pub fn new(results: Arc<dyn QuizResultRepository>) -> Self {
        Self { results }
    }

    /// Most recent results, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on repository failures.
    pub async fn list_recent(&self, limit: u32) -> Result<Vec<QuizResultListItem>, SessionError> {
        let rows = self.results.list_results(limit).await?;
        Ok(rows.iter().map(QuizResultListItem::from_row).collect())
    }

    /// Full result including per-question answers.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if missing or on repository failures.
    pub async fn get(&self, id: QuizResultId) -> Result<QuizResult, SessionError> {
        Ok(self.results.get_result(id).await?)
    }

    /// Totals over the most recent `limit` results.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on repository failures.
    pub async fn totals(&self, limit: u32) -> Result<QuizHistoryTotals, SessionError> {
        let items = self.list_recent(limit).await?;
        Ok(items
            .iter()
            .fold(QuizHistoryTotals::default(), |mut acc, item| {
                acc.sessions += 1;
                acc.score = acc.score.saturating_add(item.score);
                acc.max_score = acc.max_score.saturating_add(item.max_score);
                if item.trigger == SubmitTrigger::Expired {
                    acc.expired += 1;
                }
                acc
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{QuestionId, QuestionScore};
    use quiz_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    fn result(score: u32, trigger: SubmitTrigger) -> QuizResult {
        let remaining = if trigger == SubmitTrigger::Expired { 0 } else { 42 };
        QuizResult::new(
            fixed_now(),
            fixed_now(),
            trigger,
            remaining,
            vec![QuestionScore {
                question_id: QuestionId::new(1),
                topic: "Ecology".into(),
                answer: "habitat".into(),
                score,
                max_score: 3,
            }],
        )
    }

    #[tokio::test]
    async fn totals_sum_recent_results() {
        let repo = Arc::new(InMemoryRepository::new());
        repo.append_result(&result(1, SubmitTrigger::Manual)).await.unwrap();
        repo.append_result(&result(3, SubmitTrigger::Expired)).await.unwrap();
        let history = QuizHistoryService::new(repo);

        let items = history.list_recent(10).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].score, 3);
        assert_eq!(items[0].questions, 1);
        assert_eq!(items[0].remaining_seconds, 0);
        assert_eq!(items[1].remaining_seconds, 42);

        let totals = history.totals(10).await.unwrap();
        assert_eq!(
            totals,
            QuizHistoryTotals {
                sessions: 2,
                score: 4,
                max_score: 6,
                expired: 1,
            }
        );
        assert!(history.get(99).await.is_err());
    }
}
