use std::sync::Arc;

use rand::rng;

use storage::repository::{CheckpointRepository, RunResultRepository};
use study_core::model::{CheckpointPatch, RunResult, SessionStage, UserId};

use crate::Clock;
use crate::checkpoint_service::CheckpointService;
use crate::error::ExperimentFlowError;
use super::builder::{TimelineConfig, build_timeline};
use super::run::{ExperimentRun, FlowEvent, StepResponse};
use super::view::{StepView, view_for_step};

/// Result of answering a single step through the flow.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentAnswerResult {
    pub events: Vec<FlowEvent>,
    pub is_complete: bool,
    pub result: Option<RunResult>,
    pub result_id: Option<i64>,
}

/// Orchestrates a run against the checkpoint store and the results sink.
///
/// The run itself stays synchronous and in-memory; this service performs
/// the storage effects its [`FlowEvent`]s ask for: probing the checkpoint
/// store after id entry, clearing on "start new", writing the `PRE_DONE`
/// checkpoint, advancing the stage after the warm-up, and appending the
/// final report.
#[derive(Clone)]
pub struct ExperimentFlowService {
    clock: Clock,
    checkpoints: CheckpointService,
    results: Arc<dyn RunResultRepository>,
    operator_uid: Option<UserId>,
}

impl ExperimentFlowService {
    #[must_use]
    pub fn new(
        clock: Clock,
        checkpoints: Arc<dyn CheckpointRepository>,
        results: Arc<dyn RunResultRepository>,
    ) -> Self {
        Self {
            clock,
            checkpoints: CheckpointService::new(clock, checkpoints),
            results,
            operator_uid: None,
        }
    }

    /// Tag stored reports with the identifier resolved by the external
    /// identity service.
    #[must_use]
    pub fn with_operator(mut self, uid: UserId) -> Self {
        self.operator_uid = Some(uid);
        self
    }

    /// Builds a fresh run from the given configuration.
    #[must_use]
    pub fn start(&self, config: &TimelineConfig) -> ExperimentRun {
        let mut rng = rng();
        ExperimentRun::new(build_timeline(config, &mut rng), self.clock.now())
    }

    /// Renderable description of the step currently awaiting input.
    #[must_use]
    pub fn current_view(&self, run: &mut ExperimentRun) -> Option<StepView> {
        run.next_step().map(view_for_step)
    }

    /// Applies one response, performs the storage effects it triggers, and
    /// advances to the next runnable step.
    ///
    /// # Errors
    ///
    /// Returns `ExperimentFlowError::Timeline` for invalid input (the step
    /// stays pending) and `ExperimentFlowError::Storage` when a collaborator
    /// fails; the in-memory run is not corrupted in either case.
    pub async fn answer(
        &self,
        run: &mut ExperimentRun,
        response: StepResponse,
    ) -> Result<ExperimentAnswerResult, ExperimentFlowError> {
        // Effects are applied between the two resolution points: the
        // checkpoint probe triggered by id entry must land before the
        // resume-decision conditional is evaluated.
        let pre_events = run.resolve();
        for event in &pre_events {
            self.handle_event(run, event).await?;
        }

        let outcome = run.respond(response)?;
        for event in &outcome.events {
            self.handle_event(run, event).await?;
        }

        let post_events = run.resolve();
        for event in &post_events {
            self.handle_event(run, event).await?;
        }

        let mut events = pre_events;
        events.extend(outcome.events);
        events.extend(post_events);

        let finished = run.is_complete();
        let mut result = None;
        if finished && run.result_id().is_none() {
            let (report, id) = self.finalize(run).await?;
            result = Some(report);
            run.set_result_id(id);
        }

        Ok(ExperimentAnswerResult {
            events,
            is_complete: finished,
            result,
            result_id: run.result_id(),
        })
    }

    /// Retry report persistence after a completed run.
    ///
    /// Useful when the final append failed on a transient storage error.
    ///
    /// # Errors
    ///
    /// Returns `ExperimentFlowError::Timeline(Finished)` if the run is not
    /// over yet, or storage errors from the sink.
    pub async fn finalize_result(
        &self,
        run: &mut ExperimentRun,
    ) -> Result<i64, ExperimentFlowError> {
        if let Some(id) = run.result_id() {
            return Ok(id);
        }
        if !run.is_complete() {
            return Err(ExperimentFlowError::Timeline(
                crate::error::TimelineError::NotFinished,
            ));
        }

        let (_, id) = self.finalize(run).await?;
        run.set_result_id(id);
        Ok(id)
    }

    async fn finalize(
        &self,
        run: &ExperimentRun,
    ) -> Result<(RunResult, i64), ExperimentFlowError> {
        let report = run.result(self.clock.now(), self.operator_uid)?;
        let id = self.results.append_result(&report).await?;
        Ok((report, id))
    }

    async fn handle_event(
        &self,
        run: &mut ExperimentRun,
        event: &FlowEvent,
    ) -> Result<(), ExperimentFlowError> {
        match event {
            FlowEvent::ParticipantIdentified(participant_id) => {
                let checkpoint = self.checkpoints.get(participant_id).await?;
                run.set_resumable(checkpoint);
            }
            FlowEvent::StartedNew(participant_id) => {
                self.checkpoints.clear(participant_id).await?;
            }
            FlowEvent::PreTestCompleted => {
                if let Some((participant_id, payload)) = run.pre_checkpoint_payload()? {
                    let patch = CheckpointPatch::stage(SessionStage::PreDone)
                        .with_payload(payload.to_value()?);
                    self.checkpoints.upsert(&participant_id, patch).await?;
                }
            }
            FlowEvent::WarmUpCompleted => {
                if let Some(participant_id) = run.context().participant_id().cloned() {
                    self.checkpoints
                        .upsert(
                            &participant_id,
                            CheckpointPatch::stage(SessionStage::MonsterDone),
                        )
                        .await?;
                }
            }
            FlowEvent::Completed => {
                if let Some(participant_id) = run.context().participant_id().cloned() {
                    self.checkpoints
                        .upsert(
                            &participant_id,
                            CheckpointPatch::stage(SessionStage::PostDone),
                        )
                        .await?;
                }
            }
            FlowEvent::ConsentDeclined => {}
        }
        Ok(())
    }
}
