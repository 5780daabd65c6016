use chrono::{DateTime, Utc};
use std::fmt;

use study_core::model::{
    Checkpoint, ComparisonObservation, EstimationObservation, ParticipantId, Phase, PhaseOutcome,
    PreCheckpointPayload, ResponseRecord, RunId, RunResult, Side, UserId,
};

use crate::error::TimelineError;
use super::steps::{BlockEvent, Step, StepCondition, StepKind, Timeline};

//
// ─── RUN CONTEXT ──────────────────────────────────────────────────────────────
//

/// Participant decision on the consent screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentDecision {
    Agreed,
    Declined,
}

/// Cross-step signals, threaded explicitly through conditionals instead of
/// ambient shared state.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    consent: Option<ConsentDecision>,
    participant_id: Option<ParticipantId>,
    resuming: bool,
    resumable: Option<Checkpoint>,
}

impl RunContext {
    #[must_use]
    pub fn consent(&self) -> Option<ConsentDecision> {
        self.consent
    }

    #[must_use]
    pub fn participant_id(&self) -> Option<&ParticipantId> {
        self.participant_id.as_ref()
    }

    #[must_use]
    pub fn is_resuming(&self) -> bool {
        self.resuming
    }

    #[must_use]
    pub fn resumable(&self) -> Option<&Checkpoint> {
        self.resumable.as_ref()
    }
}

impl StepCondition {
    /// Evaluates this condition against the current run context.
    #[must_use]
    pub fn evaluate(&self, context: &RunContext) -> bool {
        match self {
            StepCondition::Always => true,
            StepCondition::Consented => {
                matches!(context.consent, Some(ConsentDecision::Agreed))
            }
            StepCondition::NotResuming => !context.resuming,
            StepCondition::HasResumableCheckpoint => context
                .resumable
                .as_ref()
                .is_some_and(Checkpoint::is_resumable),
        }
    }
}

//
// ─── RESPONSES AND EVENTS ─────────────────────────────────────────────────────
//

/// Normalized participant input for one step, supplied by the rendering
/// collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum StepResponse {
    Consent { agreed: bool },
    ParticipantId { entry: String },
    ResumeChoice { resume: bool },
    Acknowledge,
    FixationElapsed,
    Comparison { chosen: Side, rt_ms: u32 },
    /// The round countdown ran out without a choice.
    ComparisonTimeout,
    Estimation { position: f64, moved: bool, rt_ms: u32 },
}

/// Signal for the orchestration layer, emitted while stepping the run.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowEvent {
    /// Consent was declined; the run is over before any trial.
    ConsentDeclined,
    /// An id was entered; probe the checkpoint store for it.
    ParticipantIdentified(ParticipantId),
    /// The participant chose to start over; clear the stored checkpoint.
    StartedNew(ParticipantId),
    /// The pre-test finished; persist the pre-phase checkpoint.
    PreTestCompleted,
    /// The warm-up finished; advance the stored stage.
    WarmUpCompleted,
    /// The timeline is exhausted; build and hand off the result.
    Completed,
}

/// What one response did to the run.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub recorded: Option<ResponseRecord>,
    pub events: Vec<FlowEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Active,
    Declined,
    Completed,
}

//
// ─── EXPERIMENT RUN ───────────────────────────────────────────────────────────
//

/// One participant session stepping through a [`Timeline`].
///
/// Exactly one step is pending at any moment. [`ExperimentRun::respond`]
/// applies the participant's input and moves the raw cursor;
/// [`ExperimentRun::resolve`] then evaluates conditionals to find the next
/// runnable step, so the orchestrator can inject storage lookups (the
/// checkpoint probe) between the two.
pub struct ExperimentRun {
    timeline: Timeline,
    block_idx: usize,
    step_idx: usize,
    resolved: bool,
    context: RunContext,
    records: Vec<ResponseRecord>,
    run_id: RunId,
    started_at: DateTime<Utc>,
    state: RunState,
    result_id: Option<i64>,
}

impl ExperimentRun {
    #[must_use]
    pub fn new(timeline: Timeline, started_at: DateTime<Utc>) -> Self {
        Self {
            timeline,
            block_idx: 0,
            step_idx: 0,
            resolved: false,
            context: RunContext::default(),
            records: Vec::new(),
            run_id: RunId::new(),
            started_at,
            state: RunState::Active,
            result_id: None,
        }
    }

    #[must_use]
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn context(&self) -> &RunContext {
        &self.context
    }

    /// Raw response records collected so far, in answer order.
    #[must_use]
    pub fn records(&self) -> &[ResponseRecord] {
        &self.records
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        !matches!(self.state, RunState::Active)
    }

    #[must_use]
    pub fn is_declined(&self) -> bool {
        matches!(self.state, RunState::Declined)
    }

    #[must_use]
    pub fn result_id(&self) -> Option<i64> {
        self.result_id
    }

    pub(crate) fn set_result_id(&mut self, id: i64) {
        self.result_id = Some(id);
    }

    /// Injects the checkpoint-store probe result for the entered id.
    ///
    /// Must happen before the resume-decision conditional is evaluated;
    /// the orchestrator calls this on `ParticipantIdentified`.
    pub fn set_resumable(&mut self, checkpoint: Option<Checkpoint>) {
        self.context.resumable = checkpoint;
    }

    /// The step currently awaiting a response, if resolution found one.
    #[must_use]
    pub fn current_step(&self) -> Option<&Step> {
        if !self.resolved || !matches!(self.state, RunState::Active) {
            return None;
        }
        self.timeline
            .blocks()
            .get(self.block_idx)
            .and_then(|block| block.steps.get(self.step_idx))
    }

    /// Evaluates conditionals until a runnable step (or the end) is found.
    ///
    /// Skips are committed; a skipped step is never revisited. Emits
    /// [`FlowEvent::Completed`] exactly once when the timeline is
    /// exhausted.
    pub fn resolve(&mut self) -> Vec<FlowEvent> {
        let mut events = Vec::new();
        if self.resolved || !matches!(self.state, RunState::Active) {
            return events;
        }

        loop {
            let Some(block) = self.timeline.blocks().get(self.block_idx) else {
                self.state = RunState::Completed;
                events.push(FlowEvent::Completed);
                return events;
            };

            // Group-level conditional, checked when entering the block.
            if self.step_idx == 0 && !block.condition.evaluate(&self.context) {
                self.block_idx += 1;
                continue;
            }

            let Some(step) = block.steps.get(self.step_idx) else {
                self.block_idx += 1;
                self.step_idx = 0;
                continue;
            };

            if !step.condition.evaluate(&self.context) {
                self.step_idx += 1;
                continue;
            }

            self.resolved = true;
            return events;
        }
    }

    /// Convenience: resolve and return the active step.
    ///
    /// Resolution events are dropped; use [`ExperimentRun::resolve`] when
    /// the completion signal matters.
    pub fn next_step(&mut self) -> Option<&Step> {
        let _ = self.resolve();
        self.current_step()
    }

    /// Applies the participant's response to the active step.
    ///
    /// Validation failures (empty id, missing slider movement, malformed
    /// estimate) leave the step pending so the participant can retry.
    ///
    /// # Errors
    ///
    /// Returns `TimelineError::Finished` after the run ended,
    /// `TimelineError::NoActiveStep` when nothing is resolved, and
    /// `TimelineError::ResponseMismatch` for input of the wrong kind.
    pub fn respond(&mut self, response: StepResponse) -> Result<StepOutcome, TimelineError> {
        if !matches!(self.state, RunState::Active) {
            return Err(TimelineError::Finished);
        }
        if !self.resolved {
            return Err(TimelineError::NoActiveStep);
        }

        let block = &self.timeline.blocks()[self.block_idx];
        let block_len = block.steps.len();
        let on_complete = block.on_complete;
        let kind = block.steps[self.step_idx].kind.clone();

        let mut events = Vec::new();
        let mut recorded = None;

        match (&kind, response) {
            (StepKind::Consent { .. }, StepResponse::Consent { agreed }) => {
                if agreed {
                    self.context.consent = Some(ConsentDecision::Agreed);
                } else {
                    self.context.consent = Some(ConsentDecision::Declined);
                    self.state = RunState::Declined;
                    self.resolved = false;
                    events.push(FlowEvent::ConsentDeclined);
                    return Ok(StepOutcome {
                        recorded: None,
                        events,
                    });
                }
            }
            (StepKind::IdEntry, StepResponse::ParticipantId { entry }) => {
                let participant_id = ParticipantId::new(entry)?;
                self.context.participant_id = Some(participant_id.clone());
                events.push(FlowEvent::ParticipantIdentified(participant_id));
            }
            (StepKind::ResumeChoice, StepResponse::ResumeChoice { resume }) => {
                if resume {
                    self.context.resuming = true;
                } else {
                    self.context.resumable = None;
                    if let Some(participant_id) = self.context.participant_id.clone() {
                        events.push(FlowEvent::StartedNew(participant_id));
                    }
                }
            }
            (StepKind::Instruction { .. }, StepResponse::Acknowledge) => {}
            (StepKind::Fixation { .. }, StepResponse::FixationElapsed) => {}
            (
                StepKind::Comparison { trial, phase, .. },
                StepResponse::Comparison { chosen, rt_ms },
            ) => {
                recorded = Some(ResponseRecord::Comparison(ComparisonObservation::answered(
                    trial, *phase, chosen, rt_ms,
                )));
            }
            (StepKind::Comparison { trial, phase, .. }, StepResponse::ComparisonTimeout) => {
                recorded = Some(ResponseRecord::Comparison(ComparisonObservation::missed(
                    trial, *phase,
                )));
            }
            (
                StepKind::Estimation { trial, phase, .. },
                StepResponse::Estimation {
                    position,
                    moved,
                    rt_ms,
                },
            ) => {
                if !moved {
                    return Err(TimelineError::MovementRequired);
                }
                recorded = Some(ResponseRecord::Estimation(EstimationObservation::new(
                    trial,
                    *phase,
                    position,
                    Some(rt_ms),
                )?));
            }
            (kind, _) => {
                return Err(TimelineError::ResponseMismatch {
                    expected: kind.name(),
                });
            }
        }

        if let Some(record) = recorded.clone() {
            self.records.push(record);
        }

        // Advance the raw cursor; conditionals are evaluated lazily by
        // `resolve` so the orchestrator can act on the events first.
        self.step_idx += 1;
        self.resolved = false;
        if self.step_idx >= block_len {
            if let Some(event) = on_complete {
                events.push(match event {
                    BlockEvent::PreTestCompleted => FlowEvent::PreTestCompleted,
                    BlockEvent::WarmUpCompleted => FlowEvent::WarmUpCompleted,
                });
            }
        }

        Ok(StepOutcome { recorded, events })
    }

    /// Data for the `PRE_DONE` checkpoint: raw pre-phase records plus the
    /// computed pre-phase summaries.
    ///
    /// Returns `None` when no participant id was entered; the checkpoint
    /// write is silently suppressed in that case.
    ///
    /// # Errors
    ///
    /// Propagates `SummaryError` from aggregation.
    pub fn pre_checkpoint_payload(
        &self,
    ) -> Result<Option<(ParticipantId, PreCheckpointPayload)>, TimelineError> {
        let Some(participant_id) = self.context.participant_id.clone() else {
            return Ok(None);
        };

        let pre_raw: Vec<ResponseRecord> = self
            .records
            .iter()
            .filter(|record| record.phase() == Phase::Pre)
            .cloned()
            .collect();
        let pre_summary = PhaseOutcome::from_records(Phase::Pre, &self.records)?;

        Ok(Some((
            participant_id,
            PreCheckpointPayload {
                pre_raw,
                pre_summary,
            },
        )))
    }

    /// Builds the completion report.
    ///
    /// When the run was resumed, pre-phase summaries are taken verbatim
    /// from the loaded checkpoint payload; recomputation from the (empty)
    /// in-run pre records is only the fallback for foreign payloads.
    ///
    /// # Errors
    ///
    /// Propagates `SummaryError` from aggregation.
    pub fn result(
        &self,
        completed_at: DateTime<Utc>,
        operator_uid: Option<UserId>,
    ) -> Result<RunResult, TimelineError> {
        let computed_pre = PhaseOutcome::from_records(Phase::Pre, &self.records)?;
        let post = PhaseOutcome::from_records(Phase::Post, &self.records)?;

        let pre = if self.context.resuming {
            self.context
                .resumable
                .as_ref()
                .and_then(|checkpoint| PreCheckpointPayload::from_value(checkpoint.payload()))
                .map_or(computed_pre, |payload| payload.pre_summary)
        } else {
            computed_pre
        };

        Ok(RunResult {
            run_id: self.run_id,
            consented: matches!(self.context.consent, Some(ConsentDecision::Agreed)),
            participant_id: self.context.participant_id.clone(),
            operator_uid,
            resumed: self.context.resuming,
            pre,
            post,
            completed_at,
        })
    }
}

impl fmt::Debug for ExperimentRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExperimentRun")
            .field("run_id", &self.run_id)
            .field("block_idx", &self.block_idx)
            .field("step_idx", &self.step_idx)
            .field("records_len", &self.records.len())
            .field("started_at", &self.started_at)
            .field("state", &self.state)
            .field("result_id", &self.result_id)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ────────────────────────────────────────────────────────────────────
//
