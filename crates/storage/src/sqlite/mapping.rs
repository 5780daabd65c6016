use sqlx::Row;
use std::str::FromStr;

use crate::repository::{RunResultRow, StorageError};
use study_core::model::{Checkpoint, ParticipantId, RunResult, SessionStage};

pub(super) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(super) fn checkpoint_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Checkpoint, StorageError> {
    let participant_raw: String = row.try_get("participant_id").map_err(ser)?;
    let participant_id = ParticipantId::new(participant_raw).map_err(ser)?;

    let stage_raw: String = row.try_get("stage").map_err(ser)?;
    let stage = SessionStage::from_str(&stage_raw).map_err(ser)?;

    let updated_at = row.try_get("updated_at").map_err(ser)?;

    let payload_raw: String = row.try_get("payload").map_err(ser)?;
    let payload = serde_json::from_str(&payload_raw).map_err(ser)?;

    Ok(Checkpoint::new(participant_id, stage, updated_at, payload))
}

pub(super) fn run_result_from_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<RunResultRow, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    let report_raw: String = row.try_get("report").map_err(ser)?;
    let result: RunResult = serde_json::from_str(&report_raw).map_err(ser)?;
    Ok(RunResultRow::new(id, result))
}
