use std::sync::Arc;

use storage::repository::{CheckpointRepository, StorageError};
use study_core::model::{Checkpoint, CheckpointPatch, ParticipantId};

use crate::Clock;

/// Session-store facade implementing the get/upsert/clear contract.
///
/// Owns the time source so `upsert` can stamp `updated_at`; the
/// repository below it only ever sees whole records, which keeps the
/// overwrite atomic at a single write.
#[derive(Clone)]
pub struct CheckpointService {
    clock: Clock,
    checkpoints: Arc<dyn CheckpointRepository>,
}

impl CheckpointService {
    #[must_use]
    pub fn new(clock: Clock, checkpoints: Arc<dyn CheckpointRepository>) -> Self {
        Self { clock, checkpoints }
    }

    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::new(
            clock,
            Arc::new(storage::repository::InMemoryRepository::new()),
        )
    }

    /// Fetch the stored checkpoint for a participant, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures; absence is `Ok(None)`.
    pub async fn get(
        &self,
        participant_id: &ParticipantId,
    ) -> Result<Option<Checkpoint>, StorageError> {
        self.checkpoints.get(participant_id).await
    }

    /// Merge a partial update over the stored record (or defaults), stamp
    /// the current time, and store the merged record wholesale.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    pub async fn upsert(
        &self,
        participant_id: &ParticipantId,
        patch: CheckpointPatch,
    ) -> Result<Checkpoint, StorageError> {
        let existing = self.checkpoints.get(participant_id).await?;
        let merged = Checkpoint::merged(
            participant_id.clone(),
            existing.as_ref(),
            patch,
            self.clock.now(),
        );
        self.checkpoints.put(&merged).await?;
        Ok(merged)
    }

    /// Remove the stored checkpoint for a participant.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    pub async fn clear(&self, participant_id: &ParticipantId) -> Result<(), StorageError> {
        self.checkpoints.clear(participant_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_core::model::SessionStage;
    use study_core::time::{fixed_clock, fixed_now};

    fn pid(raw: &str) -> ParticipantId {
        ParticipantId::new(raw).unwrap()
    }

    #[tokio::test]
    async fn upsert_on_a_fresh_id_applies_defaults() {
        let service = CheckpointService::in_memory(fixed_clock());

        let stored = service
            .upsert(&pid("P1"), CheckpointPatch::default())
            .await
            .unwrap();

        assert_eq!(stored.stage(), SessionStage::PreDone);
        assert_eq!(stored.payload(), &serde_json::json!({}));
        assert_eq!(stored.updated_at(), fixed_now());
    }

    #[tokio::test]
    async fn upsert_merges_over_the_existing_record() {
        let repo: Arc<dyn CheckpointRepository> =
            Arc::new(storage::repository::InMemoryRepository::new());
        let mut clock = fixed_clock();
        let service = CheckpointService::new(clock, Arc::clone(&repo));

        service
            .upsert(
                &pid("P1"),
                CheckpointPatch::stage(SessionStage::PreDone)
                    .with_payload(serde_json::json!({ "a": 1 })),
            )
            .await
            .unwrap();

        clock.advance(chrono::Duration::minutes(3));
        let service = CheckpointService::new(clock, repo);
        let stored = service
            .upsert(&pid("P1"), CheckpointPatch::stage(SessionStage::MonsterDone))
            .await
            .unwrap();

        assert_eq!(stored.stage(), SessionStage::MonsterDone);
        // payload untouched by a stage-only patch
        assert_eq!(stored.payload(), &serde_json::json!({ "a": 1 }));
        assert_eq!(
            stored.updated_at(),
            fixed_now() + chrono::Duration::minutes(3)
        );

        let fetched = service.get(&pid("P1")).await.unwrap().unwrap();
        assert_eq!(fetched, stored);
    }

    #[tokio::test]
    async fn clear_then_get_reports_absence() {
        let service = CheckpointService::in_memory(fixed_clock());

        service
            .upsert(&pid("P1"), CheckpointPatch::stage(SessionStage::PreDone))
            .await
            .unwrap();
        service.clear(&pid("P1")).await.unwrap();

        assert_eq!(service.get(&pid("P1")).await.unwrap(), None);
    }
}
