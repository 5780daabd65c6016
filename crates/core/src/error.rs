use thiserror::Error;

use crate::model::checkpoint::CheckpointError;
use crate::model::estimation::EstimationError;
use crate::model::ids::ParticipantIdError;
use crate::model::response::ResponseError;
use crate::model::summary::SummaryError;
use crate::model::trial::TrialError;
use crate::model::value::ValueError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Value(#[from] ValueError),
    #[error(transparent)]
    Trial(#[from] TrialError),
    #[error(transparent)]
    Estimation(#[from] EstimationError),
    #[error(transparent)]
    Response(#[from] ResponseError),
    #[error(transparent)]
    Summary(#[from] SummaryError),
    #[error(transparent)]
    ParticipantId(#[from] ParticipantIdError),
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}
