mod builder;
mod run;
mod steps;
mod view;
mod workflow;

// Public API of the experiment subsystem.
pub use crate::error::TimelineError;
pub use builder::{TimelineConfig, build_timeline};
pub use run::{
    ConsentDecision, ExperimentRun, FlowEvent, RunContext, StepOutcome, StepResponse,
};
pub use steps::{BlockEvent, Step, StepCondition, StepKind, Timeline, TimelineBlock};
pub use view::{StepView, declined_view, view_for_step};
pub use workflow::{ExperimentAnswerResult, ExperimentFlowService};
