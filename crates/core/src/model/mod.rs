pub mod checkpoint;
pub mod estimation;
pub mod ids;
pub mod response;
pub mod summary;
pub mod trial;
pub mod value;

pub use checkpoint::{
    Checkpoint, CheckpointError, CheckpointPatch, PreCheckpointPayload, SessionStage,
};
pub use estimation::{Difficulty, EstimationError, EstimationTrial};
pub use ids::{ParticipantId, ParticipantIdError, RunId, TrialId, UserId};
pub use response::{
    ComparisonObservation, EstimationObservation, Phase, ResponseError, ResponseRecord,
};
pub use summary::{ComparisonSummary, EstimationSummary, PhaseOutcome, RunResult, SummaryError};
pub use trial::{Block, ComparisonTrial, Relation, Side, SidedComparison, TrialError};
pub use value::{Notation, Value, ValueError};
