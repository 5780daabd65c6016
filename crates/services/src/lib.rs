#![forbid(unsafe_code)]

pub mod app_services;
pub mod checkpoint_service;
pub mod error;
pub mod experiment;
pub mod generator;
pub mod identity;
pub mod results_upload;

pub use study_core::Clock;

pub use app_services::AppServices;
pub use checkpoint_service::CheckpointService;
pub use error::{AppServicesError, ExperimentFlowError, ResultsUploadError, TimelineError};
pub use experiment::{
    ExperimentAnswerResult, ExperimentFlowService, ExperimentRun, FlowEvent, StepResponse,
    StepView, Timeline, TimelineConfig,
};
pub use generator::{ComparisonCategory, GeneratedComparison};
pub use identity::{IdentityResolver, InMemoryDirectory, Role, UserRecord};
pub use results_upload::{ResultsUploadConfig, ResultsUploadService};
