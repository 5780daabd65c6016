use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::ParticipantId;
use crate::model::response::ResponseRecord;
use crate::model::summary::PhaseOutcome;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors from decoding persisted checkpoints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckpointError {
    #[error("unknown session stage: {0}")]
    InvalidStage(String),
}

//
// ─── SESSION STAGE ────────────────────────────────────────────────────────────
//

/// How far a checkpointed session had progressed when it was saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionStage {
    #[serde(rename = "PRE_DONE")]
    PreDone,
    #[serde(rename = "MONSTER_DONE")]
    MonsterDone,
    #[serde(rename = "POST_DONE")]
    PostDone,
}

impl SessionStage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStage::PreDone => "PRE_DONE",
            SessionStage::MonsterDone => "MONSTER_DONE",
            SessionStage::PostDone => "POST_DONE",
        }
    }
}

impl fmt::Display for SessionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStage {
    type Err = CheckpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PRE_DONE" => Ok(Self::PreDone),
            "MONSTER_DONE" => Ok(Self::MonsterDone),
            "POST_DONE" => Ok(Self::PostDone),
            other => Err(CheckpointError::InvalidStage(other.to_owned())),
        }
    }
}

//
// ─── CHECKPOINT ───────────────────────────────────────────────────────────────
//

/// Persisted snapshot of one participant's session progress.
///
/// Overwritten wholesale on every save; the payload is opaque JSON at
/// this level (see [`PreCheckpointPayload`] for the shape this engine
/// writes).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    participant_id: ParticipantId,
    stage: SessionStage,
    updated_at: DateTime<Utc>,
    payload: JsonValue,
}

impl Checkpoint {
    #[must_use]
    pub fn new(
        participant_id: ParticipantId,
        stage: SessionStage,
        updated_at: DateTime<Utc>,
        payload: JsonValue,
    ) -> Self {
        Self {
            participant_id,
            stage,
            updated_at,
            payload,
        }
    }

    #[must_use]
    pub fn participant_id(&self) -> &ParticipantId {
        &self.participant_id
    }

    #[must_use]
    pub fn stage(&self) -> SessionStage {
        self.stage
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    #[must_use]
    pub fn payload(&self) -> &JsonValue {
        &self.payload
    }

    /// Whether this checkpoint offers a resume point.
    ///
    /// Only `PRE_DONE` and `MONSTER_DONE` sessions can be resumed; a
    /// `POST_DONE` record describes a finished run.
    #[must_use]
    pub fn is_resumable(&self) -> bool {
        matches!(
            self.stage,
            SessionStage::PreDone | SessionStage::MonsterDone
        )
    }

    /// Merges a partial update over `existing` (or defaults) and stamps it.
    ///
    /// Missing patch fields fall back to the existing record; with no
    /// existing record the defaults are stage `PRE_DONE` and an empty
    /// payload.
    #[must_use]
    pub fn merged(
        participant_id: ParticipantId,
        existing: Option<&Checkpoint>,
        patch: CheckpointPatch,
        now: DateTime<Utc>,
    ) -> Self {
        let stage = patch
            .stage
            .or(existing.map(Checkpoint::stage))
            .unwrap_or(SessionStage::PreDone);
        let payload = patch
            .payload
            .or_else(|| existing.map(|c| c.payload.clone()))
            .unwrap_or_else(|| JsonValue::Object(serde_json::Map::new()));

        Self::new(participant_id, stage, now, payload)
    }
}

/// Partial checkpoint update; unset fields keep their stored values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckpointPatch {
    pub stage: Option<SessionStage>,
    pub payload: Option<JsonValue>,
}

impl CheckpointPatch {
    #[must_use]
    pub fn stage(stage: SessionStage) -> Self {
        Self {
            stage: Some(stage),
            payload: None,
        }
    }

    #[must_use]
    pub fn with_payload(mut self, payload: JsonValue) -> Self {
        self.payload = Some(payload);
        self
    }
}

//
// ─── PRE-TEST PAYLOAD ─────────────────────────────────────────────────────────
//

/// The payload this engine stores at the `PRE_DONE` checkpoint: raw
/// pre-phase records plus the computed pre-phase summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreCheckpointPayload {
    pub pre_raw: Vec<ResponseRecord>,
    pub pre_summary: PhaseOutcome,
}

impl PreCheckpointPayload {
    /// Serializes into an opaque checkpoint payload.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if serialization fails.
    pub fn to_value(&self) -> Result<JsonValue, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Attempts to read a stored payload back into its typed shape.
    ///
    /// Returns `None` for payloads that lack the expected fields; callers
    /// fall back to recomputation in that case.
    #[must_use]
    pub fn from_value(value: &JsonValue) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

//
// ─── TESTS ────────────────────────────────────────────────────────────────────
//
