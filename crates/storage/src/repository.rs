use async_trait::async_trait;
use quiz_core::model::{QuestionId, QuizResult};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted set of question ids the learner has already solved.
///
/// The quiz engine only reads, merges and writes this set; each backend
/// decides how it is stored.
#[async_trait]
pub trait SolvedSetStore: Send + Sync {
    /// Fetch the full solved set.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the set cannot be read.
    async fn get(&self) -> Result<BTreeSet<QuestionId>, StorageError>;

    /// Replace the solved set with `ids`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the set cannot be written.
    async fn set(&self, ids: &BTreeSet<QuestionId>) -> Result<(), StorageError>;

    /// Forget every solved id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the set cannot be cleared.
    async fn clear(&self) -> Result<(), StorageError>;
}

/// A persisted quiz result with its storage id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizResultRow {
    pub id: i64,
    pub result: QuizResult,
}

impl QuizResultRow {
    #[must_use]
    pub fn new(id: i64, result: QuizResult) -> Self {
        Self { id, result }
    }
}

/// History of submitted quiz sessions.
#[async_trait]
pub trait QuizResultRepository: Send + Sync {
    /// Append a result and return its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the result cannot be stored.
    async fn append_result(&self, result: &QuizResult) -> Result<i64, StorageError>;

    /// Fetch a result by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_result(&self, id: i64) -> Result<QuizResult, StorageError>;

    /// List the most recent results, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if results cannot be read.
    async fn list_results(&self, limit: u32) -> Result<Vec<QuizResultRow>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    solved: Arc<Mutex<BTreeSet<QuestionId>>>,
    results: Arc<Mutex<Vec<QuizResult>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl SolvedSetStore for InMemoryRepository {
    async fn get(&self) -> Result<BTreeSet<QuestionId>, StorageError> {
        let guard = self.solved.lock().map_err(poisoned)?;
        Ok(guard.clone())
    }

    async fn set(&self, ids: &BTreeSet<QuestionId>) -> Result<(), StorageError> {
        let mut guard = self.solved.lock().map_err(poisoned)?;
        guard.clone_from(ids);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let mut guard = self.solved.lock().map_err(poisoned)?;
        guard.clear();
        Ok(())
    }
}

#[async_trait]
impl QuizResultRepository for InMemoryRepository {
    async fn append_result(&self, result: &QuizResult) -> Result<i64, StorageError> {
        let mut guard = self.results.lock().map_err(poisoned)?;
        guard.push(result.clone());
        i64::try_from(guard.len()).map_err(|_| StorageError::Conflict)
    }

    async fn get_result(&self, id: i64) -> Result<QuizResult, StorageError> {
        let guard = self.results.lock().map_err(poisoned)?;
        usize::try_from(id)
            .ok()
            .and_then(|id| id.checked_sub(1))
            .and_then(|idx| guard.get(idx))
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn list_results(&self, limit: u32) -> Result<Vec<QuizResultRow>, StorageError> {
        let guard = self.results.lock().map_err(poisoned)?;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        let mut rows = Vec::with_capacity(limit.min(guard.len()));
        for (idx, result) in guard.iter().enumerate().rev().take(limit) {
            let id = i64::try_from(idx + 1).map_err(|_| StorageError::Conflict)?;
            rows.push(QuizResultRow::new(id, result.clone()));
        }
        Ok(rows)
    }
}

/// Aggregates the quiz repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub solved: Arc<dyn SolvedSetStore>,
    pub results: Arc<dyn QuizResultRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let solved: Arc<dyn SolvedSetStore> = Arc::new(repo.clone());
        let results: Arc<dyn QuizResultRepository> = Arc::new(repo);
        Self { solved, results }
    }
}
