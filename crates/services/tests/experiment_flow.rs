use std::sync::Arc;

use services::Clock;
use services::error::ExperimentFlowError;
use services::experiment::{
    ExperimentAnswerResult, ExperimentFlowService, ExperimentRun, FlowEvent, StepKind,
    StepResponse, StepView, TimelineConfig,
};
use storage::repository::{CheckpointRepository, InMemoryRepository, RunResultRepository};
use study_core::model::{ParticipantId, Phase, PreCheckpointPayload, SessionStage, Side};
use study_core::time::fixed_now;

const PARTICIPANT: &str = "KNU-0421";

fn pid() -> ParticipantId {
    ParticipantId::new(PARTICIPANT).unwrap()
}

fn flow_over(repo: &InMemoryRepository) -> ExperimentFlowService {
    ExperimentFlowService::new(
        Clock::fixed(fixed_now()),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
    )
}

/// Answers the pending step the way a cooperative participant would:
/// correct choices on scored comparisons, a +0.05 overestimate on sliders,
/// and timed-out warm-up rounds.
async fn answer_step(
    flow: &ExperimentFlowService,
    run: &mut ExperimentRun,
) -> Option<ExperimentAnswerResult> {
    let step = run.next_step()?.clone();
    let response = match &step.kind {
        StepKind::Consent { .. } => StepResponse::Consent { agreed: true },
        StepKind::IdEntry => StepResponse::ParticipantId {
            entry: PARTICIPANT.to_owned(),
        },
        StepKind::ResumeChoice => StepResponse::ResumeChoice { resume: true },
        StepKind::Instruction { .. } => StepResponse::Acknowledge,
        StepKind::Fixation { .. } => StepResponse::FixationElapsed,
        StepKind::Comparison { trial, phase, .. } => {
            if *phase == Phase::Monster {
                StepResponse::ComparisonTimeout
            } else {
                StepResponse::Comparison {
                    chosen: trial.correct_side(),
                    rt_ms: 650,
                }
            }
        }
        StepKind::Estimation { trial, .. } => StepResponse::Estimation {
            position: trial.true_value() + 0.05,
            moved: true,
            rt_ms: 1_200,
        },
    };
    Some(flow.answer(run, response).await.unwrap())
}

#[tokio::test]
async fn full_run_reports_summaries_and_persists_everything() {
    let repo = InMemoryRepository::new();
    let flow = flow_over(&repo);
    let mut run = flow.start(&TimelineConfig::default());

    let mut saw_pre_checkpoint = false;
    let mut saw_warmup_stage = false;
    let final_outcome = loop {
        let outcome = answer_step(&flow, &mut run).await.expect("step pending");

        if outcome.events.contains(&FlowEvent::PreTestCompleted) {
            let checkpoint = repo.get(&pid()).await.unwrap().expect("pre checkpoint");
            assert_eq!(checkpoint.stage(), SessionStage::PreDone);
            let payload =
                PreCheckpointPayload::from_value(checkpoint.payload()).expect("typed payload");
            assert_eq!(payload.pre_summary.comparison.total, 8);
            assert_eq!(payload.pre_summary.comparison.correct, 8);
            assert_eq!(payload.pre_raw.len(), 11);
            saw_pre_checkpoint = true;
        }
        if outcome.events.contains(&FlowEvent::WarmUpCompleted) {
            let checkpoint = repo.get(&pid()).await.unwrap().expect("warmup checkpoint");
            assert_eq!(checkpoint.stage(), SessionStage::MonsterDone);
            saw_warmup_stage = true;
        }
        if outcome.is_complete {
            break outcome;
        }
    };
    assert!(saw_pre_checkpoint);
    assert!(saw_warmup_stage);

    let result = final_outcome.result.expect("final report");
    assert!(result.consented);
    assert!(!result.resumed);
    assert_eq!(result.participant_id, Some(pid()));

    assert_eq!(result.pre.comparison.total, 8);
    assert_eq!(result.pre.comparison.accuracy, Some(1.0));
    assert_eq!(result.pre.comparison.mean_rt_ms, Some(650.0));
    assert_eq!(result.pre.estimation.total, 3);
    assert_eq!(result.pre.estimation.mean_pae, Some(5.0));
    assert_eq!(result.pre.estimation.mean_directional, Some(0.05));

    assert_eq!(result.post.comparison.total, 8);
    assert_eq!(result.post.estimation.total, 3);

    // warm-up rounds were all timed out and scored as missed
    let monster: Vec<_> = run
        .records()
        .iter()
        .filter(|r| r.phase() == Phase::Monster)
        .collect();
    assert_eq!(monster.len(), 5);
    assert!(
        monster
            .iter()
            .all(|r| r.as_comparison().is_some_and(|obs| obs.chosen.is_none() && !obs.correct))
    );

    // report landed in the sink
    let stored = repo
        .get_result(final_outcome.result_id.expect("result id"))
        .await
        .unwrap();
    assert_eq!(stored, result);

    // a finished session is no longer resumable
    let checkpoint = repo.get(&pid()).await.unwrap().expect("final checkpoint");
    assert_eq!(checkpoint.stage(), SessionStage::PostDone);
    assert!(!checkpoint.is_resumable());
    // stage-only updates preserved the pre payload
    assert!(PreCheckpointPayload::from_value(checkpoint.payload()).is_some());
}

#[tokio::test]
async fn declining_consent_ends_the_run_with_no_records() {
    let repo = InMemoryRepository::new();
    let flow = flow_over(&repo);
    let mut run = flow.start(&TimelineConfig::default());

    assert!(matches!(
        flow.current_view(&mut run),
        Some(StepView::Choice { .. })
    ));

    let outcome = flow
        .answer(&mut run, StepResponse::Consent { agreed: false })
        .await
        .unwrap();

    assert!(outcome.events.contains(&FlowEvent::ConsentDeclined));
    assert!(outcome.is_complete);
    assert!(run.is_declined());
    assert!(run.records().is_empty());
    assert_eq!(flow.current_view(&mut run), None);

    let result = outcome.result.expect("declined report");
    assert!(!result.consented);
    assert_eq!(result.participant_id, None);
    assert_eq!(result.pre.comparison.total, 0);
    assert_eq!(result.pre.comparison.accuracy, None);

    // nothing was checkpointed
    assert_eq!(repo.get(&pid()).await.unwrap(), None);
}

#[tokio::test]
async fn blank_participant_id_is_refused_and_retryable() {
    let repo = InMemoryRepository::new();
    let flow = flow_over(&repo);
    let mut run = flow.start(&TimelineConfig::default());

    flow.answer(&mut run, StepResponse::Consent { agreed: true })
        .await
        .unwrap();
    assert!(matches!(
        flow.current_view(&mut run),
        Some(StepView::TextEntry { .. })
    ));

    let err = flow
        .answer(
            &mut run,
            StepResponse::ParticipantId {
                entry: "   ".to_owned(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ExperimentFlowError::Timeline(_)));

    // the step is still pending and accepts a valid retry
    assert!(matches!(
        flow.current_view(&mut run),
        Some(StepView::TextEntry { .. })
    ));
    let outcome = flow
        .answer(
            &mut run,
            StepResponse::ParticipantId {
                entry: PARTICIPANT.to_owned(),
            },
        )
        .await
        .unwrap();
    assert!(
        outcome
            .events
            .contains(&FlowEvent::ParticipantIdentified(pid()))
    );
}

#[tokio::test]
async fn estimation_submit_without_movement_keeps_the_step() {
    let repo = InMemoryRepository::new();
    let flow = flow_over(&repo);
    let mut run = flow.start(&TimelineConfig::default());

    // drive until the first slider
    loop {
        let step = run.next_step().expect("step pending").clone();
        if matches!(step.kind, StepKind::Estimation { .. }) {
            break;
        }
        answer_step(&flow, &mut run).await.expect("step pending");
    }

    let err = flow
        .answer(
            &mut run,
            StepResponse::Estimation {
                position: 0.5,
                moved: false,
                rt_ms: 400,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ExperimentFlowError::Timeline(services::TimelineError::MovementRequired)
    ));
    assert!(matches!(
        flow.current_view(&mut run),
        Some(StepView::Slider { .. })
    ));
}

#[tokio::test]
async fn correct_choice_follows_the_greater_magnitude() {
    let repo = InMemoryRepository::new();
    let flow = flow_over(&repo);
    let mut run = flow.start(&TimelineConfig::default());

    // drive to the first scored comparison and answer it wrong on purpose
    loop {
        let step = run.next_step().expect("step pending").clone();
        if let StepKind::Comparison { trial, .. } = &step.kind {
            let wrong: Side = trial.correct_side().opposite();
            flow.answer(
                &mut run,
                StepResponse::Comparison {
                    chosen: wrong,
                    rt_ms: 500,
                },
            )
            .await
            .unwrap();
            break;
        }
        answer_step(&flow, &mut run).await.expect("step pending");
    }

    let observation = run.records()[0].as_comparison().expect("comparison record");
    assert!(!observation.correct);
    assert_eq!(observation.phase, Phase::Pre);
}
