use study_core::model::{EstimationTrial, Phase, SidedComparison};

//
// ─── STEP DESCRIPTIONS ────────────────────────────────────────────────────────
//

/// What a single timeline step asks of the participant.
///
/// A closed set so the sequencer and the rendering collaborator share an
/// exhaustively-matchable contract.
#[derive(Debug, Clone, PartialEq)]
pub enum StepKind {
    Consent {
        title: String,
    },
    IdEntry,
    ResumeChoice,
    Instruction {
        title: String,
        body: String,
    },
    Fixation {
        duration_ms: u32,
    },
    Comparison {
        trial: SidedComparison,
        phase: Phase,
        /// Countdown for timed rounds; `None` waits for the choice.
        round_time_ms: Option<u32>,
        index: u32,
        total: u32,
    },
    Estimation {
        trial: EstimationTrial,
        phase: Phase,
        index: u32,
        total: u32,
    },
}

impl StepKind {
    /// Task name used in data tags and error messages.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            StepKind::Consent { .. } => "consent",
            StepKind::IdEntry => "id_entry",
            StepKind::ResumeChoice => "resume_choice",
            StepKind::Instruction { .. } => "instruction",
            StepKind::Fixation { .. } => "fixation",
            StepKind::Comparison { .. } => "magnitude_compare",
            StepKind::Estimation { .. } => "number_line_estimation",
        }
    }
}

/// Condition checked against the run context immediately before a step
/// (or a whole block) would run; false skips it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepCondition {
    Always,
    Consented,
    NotResuming,
    HasResumableCheckpoint,
}

/// One presentable step with its data tags.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub kind: StepKind,
    pub phase: Option<Phase>,
    pub condition: StepCondition,
}

impl Step {
    #[must_use]
    pub fn new(kind: StepKind) -> Self {
        Self {
            kind,
            phase: None,
            condition: StepCondition::Always,
        }
    }

    #[must_use]
    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }

    #[must_use]
    pub fn with_condition(mut self, condition: StepCondition) -> Self {
        self.condition = condition;
        self
    }
}

//
// ─── BLOCKS ───────────────────────────────────────────────────────────────────
//

/// Hook fired when a block that actually ran reaches its last step.
///
/// Blocks skipped by their condition never fire their hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockEvent {
    PreTestCompleted,
    WarmUpCompleted,
}

/// Named sub-timeline with a group-level condition.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineBlock {
    pub name: &'static str,
    pub condition: StepCondition,
    pub steps: Vec<Step>,
    pub on_complete: Option<BlockEvent>,
}

impl TimelineBlock {
    #[must_use]
    pub fn new(name: &'static str, condition: StepCondition, steps: Vec<Step>) -> Self {
        Self {
            name,
            condition,
            steps,
            on_complete: None,
        }
    }

    #[must_use]
    pub fn with_on_complete(mut self, event: BlockEvent) -> Self {
        self.on_complete = Some(event);
        self
    }
}

/// Ordered list of blocks making up one experiment session.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    blocks: Vec<TimelineBlock>,
}

impl Timeline {
    #[must_use]
    pub fn new(blocks: Vec<TimelineBlock>) -> Self {
        Self { blocks }
    }

    #[must_use]
    pub fn blocks(&self) -> &[TimelineBlock] {
        &self.blocks
    }

    /// Total authored steps, before any conditional skipping.
    #[must_use]
    pub fn total_steps(&self) -> usize {
        self.blocks.iter().map(|block| block.steps.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_builders_set_tags() {
        let step = Step::new(StepKind::IdEntry)
            .with_phase(Phase::Pre)
            .with_condition(StepCondition::Consented);
        assert_eq!(step.phase, Some(Phase::Pre));
        assert_eq!(step.condition, StepCondition::Consented);
        assert_eq!(step.kind.name(), "id_entry");
    }

    #[test]
    fn timeline_counts_steps_across_blocks() {
        let timeline = Timeline::new(vec![
            TimelineBlock::new(
                "a",
                StepCondition::Always,
                vec![Step::new(StepKind::IdEntry)],
            ),
            TimelineBlock::new(
                "b",
                StepCondition::Always,
                vec![
                    Step::new(StepKind::Fixation { duration_ms: 350 }),
                    Step::new(StepKind::ResumeChoice),
                ],
            ),
        ]);
        assert_eq!(timeline.total_steps(), 3);
    }
}
