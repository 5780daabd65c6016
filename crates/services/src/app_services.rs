use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::checkpoint_service::CheckpointService;
use crate::error::AppServicesError;
use crate::experiment::ExperimentFlowService;
use crate::results_upload::ResultsUploadService;

/// Assembles participant-facing services over a storage backend.
#[derive(Clone)]
pub struct AppServices {
    checkpoints: CheckpointService,
    experiment_flow: Arc<ExperimentFlowService>,
    results_upload: Arc<ResultsUploadService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(clock, &storage))
    }

    /// Build services over in-memory storage, for tests and local runs.
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::from_storage(clock, &Storage::in_memory())
    }

    #[must_use]
    pub fn from_storage(clock: Clock, storage: &Storage) -> Self {
        let checkpoints = CheckpointService::new(clock, Arc::clone(&storage.checkpoints));
        let experiment_flow = Arc::new(ExperimentFlowService::new(
            clock,
            Arc::clone(&storage.checkpoints),
            Arc::clone(&storage.results),
        ));
        let results_upload = Arc::new(ResultsUploadService::from_env());

        Self {
            checkpoints,
            experiment_flow,
            results_upload,
        }
    }

    #[must_use]
    pub fn checkpoints(&self) -> CheckpointService {
        self.checkpoints.clone()
    }

    #[must_use]
    pub fn experiment_flow(&self) -> Arc<ExperimentFlowService> {
        Arc::clone(&self.experiment_flow)
    }

    #[must_use]
    pub fn results_upload(&self) -> Arc<ResultsUploadService> {
        Arc::clone(&self.results_upload)
    }
}
