use rand::Rng;

use study_core::model::{Block, ComparisonTrial, EstimationTrial, Phase, TrialId};
use study_core::stimuli;

use crate::generator::{generate_comparison, randomize_sides};
use super::steps::{BlockEvent, Step, StepCondition, StepKind, Timeline, TimelineBlock};

/// Knobs for assembling a session timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineConfig {
    pub title: String,
    /// Cap per comparison block, mainly for quick debug runs.
    pub comparison_limit: Option<usize>,
    /// Cap per estimation block.
    pub estimation_limit: Option<usize>,
    pub fixation_ms: u32,
    pub warmup_rounds: u32,
    pub warmup_round_time_ms: u32,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            title: "Numeracy Screener".to_owned(),
            comparison_limit: None,
            estimation_limit: None,
            fixation_ms: 350,
            warmup_rounds: 5,
            warmup_round_time_ms: 5_000,
        }
    }
}

/// Assembles the full session sequence.
///
/// Order: consent -> id entry -> resume decision (only when a resumable
/// checkpoint is loaded) -> pre-test comparison and estimation (skipped
/// when resuming; estimation completion is the checkpoint hook) -> timed
/// warm-up -> post-test comparison and estimation.
pub fn build_timeline(config: &TimelineConfig, rng: &mut impl Rng) -> Timeline {
    let comparisons = stimuli::comparison_pool();
    let estimations = stimuli::estimation_pool();

    let blocks = vec![
        consent_block(config),
        resume_block(),
        comparison_block(
            "pre-comparison",
            Phase::Pre,
            Block::PreInstruction,
            StepCondition::NotResuming,
            &comparisons,
            config,
            rng,
        ),
        estimation_block(
            "pre-estimation",
            Phase::Pre,
            Block::PreInstruction,
            StepCondition::NotResuming,
            &estimations,
            config,
        )
        .with_on_complete(BlockEvent::PreTestCompleted),
        warmup_block(config, rng).with_on_complete(BlockEvent::WarmUpCompleted),
        comparison_block(
            "post-comparison",
            Phase::Post,
            Block::PostInstruction,
            StepCondition::Always,
            &comparisons,
            config,
            rng,
        ),
        estimation_block(
            "post-estimation",
            Phase::Post,
            Block::PostInstruction,
            StepCondition::Always,
            &estimations,
            config,
        ),
    ];

    Timeline::new(blocks)
}

fn consent_block(config: &TimelineConfig) -> TimelineBlock {
    TimelineBlock::new(
        "consent",
        StepCondition::Always,
        vec![
            Step::new(StepKind::Consent {
                title: config.title.clone(),
            }),
            // Only reachable once consent was given.
            Step::new(StepKind::IdEntry).with_condition(StepCondition::Consented),
        ],
    )
}

fn resume_block() -> TimelineBlock {
    TimelineBlock::new(
        "resume",
        StepCondition::HasResumableCheckpoint,
        vec![Step::new(StepKind::ResumeChoice)],
    )
}

fn comparison_block(
    name: &'static str,
    phase: Phase,
    block: Block,
    condition: StepCondition,
    pool: &[ComparisonTrial],
    config: &TimelineConfig,
    rng: &mut impl Rng,
) -> TimelineBlock {
    let limit = config.comparison_limit.unwrap_or(usize::MAX);
    let selected: Vec<&ComparisonTrial> = pool
        .iter()
        .filter(|trial| trial.block() == block)
        .take(limit)
        .collect();
    let total = u32::try_from(selected.len()).unwrap_or(u32::MAX);

    let mut steps = vec![
        Step::new(StepKind::Instruction {
            title: "MAGNITUDE COMPARISON".to_owned(),
            body: "Pick which value is larger.".to_owned(),
        })
        .with_phase(phase),
    ];

    for (idx, trial) in selected.into_iter().enumerate() {
        steps.push(
            Step::new(StepKind::Fixation {
                duration_ms: config.fixation_ms,
            })
            .with_phase(phase),
        );
        steps.push(
            Step::new(StepKind::Comparison {
                trial: randomize_sides(rng, trial),
                phase,
                round_time_ms: None,
                index: u32::try_from(idx).unwrap_or(u32::MAX).saturating_add(1),
                total,
            })
            .with_phase(phase),
        );
    }

    TimelineBlock::new(name, condition, steps)
}

fn estimation_block(
    name: &'static str,
    phase: Phase,
    block: Block,
    condition: StepCondition,
    pool: &[EstimationTrial],
    config: &TimelineConfig,
) -> TimelineBlock {
    let limit = config.estimation_limit.unwrap_or(usize::MAX);
    let selected: Vec<&EstimationTrial> = pool
        .iter()
        .filter(|trial| trial.block() == Some(block))
        .take(limit)
        .collect();
    let total = u32::try_from(selected.len()).unwrap_or(u32::MAX);

    let mut steps = vec![
        Step::new(StepKind::Instruction {
            title: "NUMBER LINE ESTIMATION".to_owned(),
            body: "Place the value on a 0-1 number line.".to_owned(),
        })
        .with_phase(phase),
    ];

    for (idx, trial) in selected.into_iter().enumerate() {
        steps.push(
            Step::new(StepKind::Estimation {
                trial: *trial,
                phase,
                index: u32::try_from(idx).unwrap_or(u32::MAX).saturating_add(1),
                total,
            })
            .with_phase(phase),
        );
    }

    TimelineBlock::new(name, condition, steps)
}

fn warmup_block(config: &TimelineConfig, rng: &mut impl Rng) -> TimelineBlock {
    let mut steps = vec![
        Step::new(StepKind::Instruction {
            title: "MONSTER GAME (WARM-UP)".to_owned(),
            body: "A short timed round with feedback. Answer before the countdown runs out."
                .to_owned(),
        })
        .with_phase(Phase::Monster),
    ];

    for round in 1..=config.warmup_rounds {
        let generated = generate_comparison(rng, TrialId::new(round));
        steps.push(
            Step::new(StepKind::Comparison {
                trial: generated.trial,
                phase: Phase::Monster,
                round_time_ms: Some(config.warmup_round_time_ms),
                index: round,
                total: config.warmup_rounds,
            })
            .with_phase(Phase::Monster),
        );
    }

    TimelineBlock::new("monster", StepCondition::Always, steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn build_default() -> Timeline {
        let mut rng = StdRng::seed_from_u64(3);
        build_timeline(&TimelineConfig::default(), &mut rng)
    }

    #[test]
    fn block_order_matches_the_session_protocol() {
        let timeline = build_default();
        let names: Vec<&str> = timeline.blocks().iter().map(|b| b.name).collect();
        assert_eq!(
            names,
            vec![
                "consent",
                "resume",
                "pre-comparison",
                "pre-estimation",
                "monster",
                "post-comparison",
                "post-estimation",
            ]
        );
    }

    #[test]
    fn pre_blocks_are_conditional_on_not_resuming() {
        let timeline = build_default();
        let pre_comparison = &timeline.blocks()[2];
        let pre_estimation = &timeline.blocks()[3];
        assert_eq!(pre_comparison.condition, StepCondition::NotResuming);
        assert_eq!(pre_estimation.condition, StepCondition::NotResuming);
        assert_eq!(
            pre_estimation.on_complete,
            Some(BlockEvent::PreTestCompleted)
        );
    }

    #[test]
    fn warmup_rounds_carry_a_countdown() {
        let timeline = build_default();
        let monster = &timeline.blocks()[4];
        let rounds: Vec<&Step> = monster
            .steps
            .iter()
            .filter(|s| matches!(s.kind, StepKind::Comparison { .. }))
            .collect();
        assert_eq!(rounds.len(), 5);
        for step in rounds {
            match &step.kind {
                StepKind::Comparison {
                    round_time_ms,
                    phase,
                    ..
                } => {
                    assert_eq!(*round_time_ms, Some(5_000));
                    assert_eq!(*phase, Phase::Monster);
                }
                _ => unreachable!(),
            }
        }
    }

    #[test]
    fn comparison_limit_caps_each_block() {
        let mut rng = StdRng::seed_from_u64(5);
        let config = TimelineConfig {
            comparison_limit: Some(2),
            ..TimelineConfig::default()
        };
        let timeline = build_timeline(&config, &mut rng);

        let trials = |name: &str| {
            timeline
                .blocks()
                .iter()
                .find(|b| b.name == name)
                .map(|b| {
                    b.steps
                        .iter()
                        .filter(|s| matches!(s.kind, StepKind::Comparison { .. }))
                        .count()
                })
                .unwrap_or_default()
        };
        assert_eq!(trials("pre-comparison"), 2);
        assert_eq!(trials("post-comparison"), 2);
    }

    #[test]
    fn each_comparison_trial_is_preceded_by_a_fixation() {
        let timeline = build_default();
        let pre = &timeline.blocks()[2];
        for (idx, step) in pre.steps.iter().enumerate() {
            if matches!(step.kind, StepKind::Comparison { .. }) {
                assert!(matches!(
                    pre.steps[idx - 1].kind,
                    StepKind::Fixation { .. }
                ));
            }
        }
    }
}
