use async_trait::async_trait;

use super::{SqliteRepository, mapping};
use crate::repository::{RunResultRepository, RunResultRow, StorageError};
use study_core::model::{ParticipantId, RunResult};

#[async_trait]
impl RunResultRepository for SqliteRepository {
    async fn append_result(&self, result: &RunResult) -> Result<i64, StorageError> {
        let report = serde_json::to_string(result).map_err(mapping::ser)?;

        let res = sqlx::query(
            r"
                INSERT INTO run_results (
                    run_id, participant_id, consented, resumed, completed_at, report
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(result.run_id.value().to_string())
        .bind(result.participant_id.as_ref().map(ParticipantId::as_str))
        .bind(i64::from(result.consented))
        .bind(i64::from(result.resumed))
        .bind(result.completed_at)
        .bind(report)
        .execute(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(res.last_insert_rowid())
    }

    async fn get_result(&self, id: i64) -> Result<RunResult, StorageError> {
        let row = sqlx::query(
            r"
                SELECT id, report
                FROM run_results
                WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .ok_or(StorageError::NotFound)?;

        mapping::run_result_from_row(&row).map(|row| row.result)
    }

    async fn list_results_for(
        &self,
        participant_id: &ParticipantId,
    ) -> Result<Vec<RunResultRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, report
                FROM run_results
                WHERE participant_id = ?1
                ORDER BY completed_at DESC, id DESC
            ",
        )
        .bind(participant_id.as_str())
        .fetch_all(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(mapping::run_result_from_row(&row)?);
        }

        Ok(out)
    }
}
