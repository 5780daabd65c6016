use async_trait::async_trait;

use super::{SqliteRepository, mapping};
use crate::repository::{CheckpointRepository, StorageError, storage_key};
use study_core::model::{Checkpoint, ParticipantId};

#[async_trait]
impl CheckpointRepository for SqliteRepository {
    async fn get(
        &self,
        participant_id: &ParticipantId,
    ) -> Result<Option<Checkpoint>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT participant_id, stage, updated_at, payload
                FROM checkpoints
                WHERE key = ?1
            ",
        )
        .bind(storage_key(participant_id))
        .fetch_optional(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.map(|row| mapping::checkpoint_from_row(&row)).transpose()
    }

    async fn put(&self, checkpoint: &Checkpoint) -> Result<(), StorageError> {
        let payload = serde_json::to_string(checkpoint.payload()).map_err(mapping::ser)?;

        // One statement per save: the whole record is replaced atomically.
        sqlx::query(
            r"
                INSERT INTO checkpoints (key, participant_id, stage, updated_at, payload)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(key) DO UPDATE SET
                    participant_id = excluded.participant_id,
                    stage = excluded.stage,
                    updated_at = excluded.updated_at,
                    payload = excluded.payload
            ",
        )
        .bind(storage_key(checkpoint.participant_id()))
        .bind(checkpoint.participant_id().as_str())
        .bind(checkpoint.stage().as_str())
        .bind(checkpoint.updated_at())
        .bind(payload)
        .execute(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn clear(&self, participant_id: &ParticipantId) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM checkpoints WHERE key = ?1")
            .bind(storage_key(participant_id))
            .execute(self.pool())
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }
}
