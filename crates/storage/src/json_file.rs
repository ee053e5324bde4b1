use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use quiz_core::model::QuestionId;
use tokio::sync::Mutex;

use crate::repository::{SolvedSetStore, StorageError};

/// Solved set kept as a JSON array of ids in a single file.
///
/// A missing file reads as an empty set. Writes go through a sibling temp
/// file and a rename so a crash never leaves a truncated array behind.
#[derive(Debug)]
pub struct JsonFileSolvedSetStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileSolvedSetStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_ids(&self, ids: &BTreeSet<QuestionId>) -> Result<(), StorageError> {
        let json = serde_json::to_vec(ids).map_err(|e| StorageError::Serialization(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl SolvedSetStore for JsonFileSolvedSetStore {
    async fn get(&self) -> Result<BTreeSet<QuestionId>, StorageError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| StorageError::Serialization(e.to_string())),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(BTreeSet::new()),
            Err(err) => Err(StorageError::Connection(err.to_string())),
        }
    }

    async fn set(&self, ids: &BTreeSet<QuestionId>) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        self.write_ids(ids).await
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::Connection(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_reads_empty_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileSolvedSetStore::new(dir.path().join("solved.json"));
        assert!(store.get().await.unwrap().is_empty());

        let ids: BTreeSet<_> = [QuestionId::new(3), QuestionId::new(1)].into();
        store.set(&ids).await.unwrap();
        assert_eq!(store.get().await.unwrap(), ids);

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw, "[1,3]");

        store.clear().await.unwrap();
        assert!(store.get().await.unwrap().is_empty());
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn corrupt_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("solved.json");
        std::fs::write(&path, "not json").unwrap();
        let store = JsonFileSolvedSetStore::new(path);
        assert!(matches!(
            store.get().await,
            Err(StorageError::Serialization(_))
        ));
    }
}
