use std::env;

use reqwest::Client;
use serde::Serialize;

use study_core::model::RunResult;

use crate::error::ResultsUploadError;

/// Endpoint configuration for the external results sink.
#[derive(Clone, Debug)]
pub struct ResultsUploadConfig {
    pub base_url: String,
    pub api_key: String,
}

impl ResultsUploadConfig {
    /// Reads `STUDY_SINK_BASE_URL` and `STUDY_SINK_API_KEY`.
    ///
    /// Returns `None` when either is missing or blank; the upload service
    /// then stays disabled and runs are only stored locally.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("STUDY_SINK_BASE_URL").ok()?;
        let api_key = env::var("STUDY_SINK_API_KEY").ok()?;
        if base_url.trim().is_empty() || api_key.trim().is_empty() {
            return None;
        }
        Some(Self { base_url, api_key })
    }
}

/// Pushes finished-run reports to the hosted results sink.
#[derive(Clone)]
pub struct ResultsUploadService {
    client: Client,
    config: Option<ResultsUploadConfig>,
}

impl ResultsUploadService {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(ResultsUploadConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<ResultsUploadConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    /// Upload one finished run.
    ///
    /// # Errors
    ///
    /// Returns `ResultsUploadError` when the service is disabled, the
    /// request fails, or the sink answers with a non-success status.
    pub async fn upload(&self, result: &RunResult) -> Result<(), ResultsUploadError> {
        let config = self.config.as_ref().ok_or(ResultsUploadError::Disabled)?;

        let url = format!("{}/run_results", config.base_url.trim_end_matches('/'));
        let payload = UploadRequest {
            source: "experiment-engine",
            result,
        };
        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ResultsUploadError::HttpStatus(response.status()));
        }

        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct UploadRequest<'a> {
    source: &'static str,
    result: &'a RunResult,
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_core::model::{Phase, PhaseOutcome, RunId};
    use study_core::time::fixed_now;

    fn build_result() -> RunResult {
        let empty = PhaseOutcome::from_records(Phase::Pre, &[]).unwrap();
        RunResult {
            run_id: RunId::new(),
            consented: true,
            participant_id: None,
            operator_uid: None,
            resumed: false,
            pre: empty.clone(),
            post: empty,
            completed_at: fixed_now(),
        }
    }

    #[tokio::test]
    async fn unconfigured_service_refuses_to_upload() {
        let service = ResultsUploadService::new(None);
        assert!(!service.enabled());

        let err = service.upload(&build_result()).await.unwrap_err();
        assert!(matches!(err, ResultsUploadError::Disabled));
    }
}
