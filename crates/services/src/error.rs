//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use study_core::model::{ParticipantIdError, ResponseError, SummaryError};

/// Errors emitted while stepping through an experiment timeline.
///
/// Input-validation variants (`ParticipantId`, `MovementRequired`,
/// `Response`) leave the active step in place so the participant can try
/// again; they are never fatal to the run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TimelineError {
    #[error("the run has already finished")]
    Finished,
    #[error("the run is not finished yet")]
    NotFinished,
    #[error("no step is active; resolve the timeline first")]
    NoActiveStep,
    #[error("response does not match the active step (expected {expected})")]
    ResponseMismatch { expected: &'static str },
    #[error("move the marker at least once before submitting")]
    MovementRequired,
    #[error(transparent)]
    ParticipantId(#[from] ParticipantIdError),
    #[error(transparent)]
    Response(#[from] ResponseError),
    #[error(transparent)]
    Summary(#[from] SummaryError),
}

/// Errors emitted by the experiment flow orchestration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExperimentFlowError {
    #[error(transparent)]
    Timeline(#[from] TimelineError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("checkpoint payload could not be encoded: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Errors emitted by `ResultsUploadService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResultsUploadError {
    #[error("results upload is not configured")]
    Disabled,
    #[error("results upload failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
