use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use study_core::model::{Checkpoint, ParticipantId, RunResult};

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

/// Key under which a participant's checkpoint is stored.
///
/// The `session:` prefix keeps checkpoints in their own namespace within
/// the shared key-value space.
#[must_use]
pub fn storage_key(participant_id: &ParticipantId) -> String {
    format!("session:{}", participant_id.as_str())
}

/// Repository contract for session checkpoints.
///
/// One record per participant; `put` overwrites the whole record in a
/// single write. A missing record is a normal `None`, not an error.
#[async_trait]
pub trait CheckpointRepository: Send + Sync {
    /// Fetch the checkpoint for a participant, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures; absence is `Ok(None)`.
    async fn get(&self, participant_id: &ParticipantId)
    -> Result<Option<Checkpoint>, StorageError>;

    /// Store a checkpoint, replacing any existing record wholesale.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn put(&self, checkpoint: &Checkpoint) -> Result<(), StorageError>;

    /// Remove the checkpoint for a participant. Removing a missing record
    /// is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn clear(&self, participant_id: &ParticipantId) -> Result<(), StorageError>;
}

/// Persisted shape for a stored run result.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResultRow {
    pub id: i64,
    pub result: RunResult,
}

impl RunResultRow {
    #[must_use]
    pub fn new(id: i64, result: RunResult) -> Self {
        Self { id, result }
    }
}

/// Repository contract for finished-run reports (the durable results sink).
#[async_trait]
pub trait RunResultRepository: Send + Sync {
    /// Append a finished run and return its storage id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the result cannot be stored.
    async fn append_result(&self, result: &RunResult) -> Result<i64, StorageError>;

    /// Fetch a stored run by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_result(&self, id: i64) -> Result<RunResult, StorageError>;

    /// List stored runs for a participant, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn list_results_for(
        &self,
        participant_id: &ParticipantId,
    ) -> Result<Vec<RunResultRow>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    checkpoints: Arc<Mutex<HashMap<String, Checkpoint>>>,
    results: Arc<Mutex<Vec<RunResultRow>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            checkpoints: Arc::new(Mutex::new(HashMap::new())),
            results: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl CheckpointRepository for InMemoryRepository {
    async fn get(
        &self,
        participant_id: &ParticipantId,
    ) -> Result<Option<Checkpoint>, StorageError> {
        let guard = self
            .checkpoints
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&storage_key(participant_id)).cloned())
    }

    async fn put(&self, checkpoint: &Checkpoint) -> Result<(), StorageError> {
        let mut guard = self
            .checkpoints
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(storage_key(checkpoint.participant_id()), checkpoint.clone());
        Ok(())
    }

    async fn clear(&self, participant_id: &ParticipantId) -> Result<(), StorageError> {
        let mut guard = self
            .checkpoints
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(&storage_key(participant_id));
        Ok(())
    }
}

#[async_trait]
impl RunResultRepository for InMemoryRepository {
    async fn append_result(&self, result: &RunResult) -> Result<i64, StorageError> {
        let mut guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let id = i64::try_from(guard.len())
            .map_err(|_| StorageError::Serialization("row id overflow".into()))?
            + 1;
        guard.push(RunResultRow::new(id, result.clone()));
        Ok(id)
    }

    async fn get_result(&self, id: i64) -> Result<RunResult, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .iter()
            .find(|row| row.id == id)
            .map(|row| row.result.clone())
            .ok_or(StorageError::NotFound)
    }

    async fn list_results_for(
        &self,
        participant_id: &ParticipantId,
    ) -> Result<Vec<RunResultRow>, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut rows: Vec<RunResultRow> = guard
            .iter()
            .filter(|row| row.result.participant_id.as_ref() == Some(participant_id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.result
                .completed_at
                .cmp(&a.result.completed_at)
                .then(b.id.cmp(&a.id))
        });
        Ok(rows)
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub checkpoints: Arc<dyn CheckpointRepository>,
    pub results: Arc<dyn RunResultRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let checkpoints: Arc<dyn CheckpointRepository> = Arc::new(repo.clone());
        let results: Arc<dyn RunResultRepository> = Arc::new(repo);
        Self {
            checkpoints,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_core::model::{Phase, PhaseOutcome, RunId, SessionStage};
    use study_core::time::fixed_now;

    fn pid(raw: &str) -> ParticipantId {
        ParticipantId::new(raw).unwrap()
    }

    fn build_checkpoint(participant: &str, stage: SessionStage) -> Checkpoint {
        Checkpoint::new(
            pid(participant),
            stage,
            fixed_now(),
            serde_json::json!({ "a": 1 }),
        )
    }

    fn build_result(participant: Option<&str>) -> RunResult {
        let empty = PhaseOutcome::from_records(Phase::Pre, &[]).unwrap();
        RunResult {
            run_id: RunId::new(),
            consented: true,
            participant_id: participant.map(pid),
            operator_uid: None,
            resumed: false,
            pre: empty.clone(),
            post: empty,
            completed_at: fixed_now(),
        }
    }

    #[tokio::test]
    async fn checkpoint_put_get_clear_roundtrip() {
        let repo = InMemoryRepository::new();
        let id = pid("P1");

        assert_eq!(repo.get(&id).await.unwrap(), None);

        let checkpoint = build_checkpoint("P1", SessionStage::PreDone);
        repo.put(&checkpoint).await.unwrap();
        assert_eq!(repo.get(&id).await.unwrap(), Some(checkpoint.clone()));

        // put replaces the whole record
        let replaced = build_checkpoint("P1", SessionStage::MonsterDone);
        repo.put(&replaced).await.unwrap();
        assert_eq!(
            repo.get(&id).await.unwrap().map(|c| c.stage()),
            Some(SessionStage::MonsterDone)
        );

        repo.clear(&id).await.unwrap();
        assert_eq!(repo.get(&id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn clear_missing_checkpoint_is_not_an_error() {
        let repo = InMemoryRepository::new();
        repo.clear(&pid("ghost")).await.unwrap();
    }

    #[tokio::test]
    async fn results_append_and_list_by_participant() {
        let repo = InMemoryRepository::new();

        let id_a = repo.append_result(&build_result(Some("P1"))).await.unwrap();
        let id_b = repo.append_result(&build_result(Some("P2"))).await.unwrap();
        assert_ne!(id_a, id_b);

        let fetched = repo.get_result(id_a).await.unwrap();
        assert_eq!(fetched.participant_id, Some(pid("P1")));

        let listed = repo.list_results_for(&pid("P1")).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id_a);

        let err = repo.get_result(999).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn anonymous_results_are_stored_but_not_listed() {
        let repo = InMemoryRepository::new();
        let id = repo.append_result(&build_result(None)).await.unwrap();

        assert!(repo.get_result(id).await.is_ok());
        assert!(repo.list_results_for(&pid("P1")).await.unwrap().is_empty());
    }
}
