use super::steps::{Step, StepKind};

/// Presentation-agnostic renderable description of one step.
///
/// This is intentionally **not** a UI view-model:
/// - no markup, no styling
/// - no localization assumptions
///
/// The rendering collaborator draws it however it likes and hands back a
/// normalized [`super::StepResponse`].
#[derive(Debug, Clone, PartialEq)]
pub enum StepView {
    /// A titled screen with labelled buttons.
    Choice {
        title: String,
        body: String,
        choices: Vec<String>,
    },
    /// A single free-text field.
    TextEntry {
        title: String,
        prompt: String,
        placeholder: String,
    },
    /// Two stimulus cards side by side; `countdown_ms` is set for timed
    /// rounds.
    ComparisonCards {
        title: String,
        left: String,
        right: String,
        countdown_ms: Option<u32>,
        position: Option<(u32, u32)>,
    },
    /// A 0-100 slider over a 0-1 number line.
    Slider {
        title: String,
        stimulus: String,
        min: u32,
        max: u32,
        start: u32,
        labels: Vec<String>,
        require_movement: bool,
        position: Option<(u32, u32)>,
    },
    /// A fixation symbol shown for a fixed duration.
    Fixation { symbol: String, duration_ms: u32 },
    /// A terminal message with no input.
    Message { title: String, body: String },
}

/// Translates a timeline step into its renderable description.
#[must_use]
pub fn view_for_step(step: &Step) -> StepView {
    match &step.kind {
        StepKind::Consent { title } => StepView::Choice {
            title: title.clone(),
            body: "This activity is part of a research study about how people understand \
                   numbers. It includes two short tasks (comparison and estimation). You can \
                   stop at any time."
                .to_owned(),
            choices: vec!["I Agree".to_owned(), "I Do Not Agree".to_owned()],
        },
        StepKind::IdEntry => StepView::TextEntry {
            title: "Participant ID".to_owned(),
            prompt: "Enter your assigned participant ID (or a short code). Do not enter your \
                     name."
                .to_owned(),
            placeholder: "e.g., KNU-0421".to_owned(),
        },
        StepKind::ResumeChoice => StepView::Choice {
            title: "Session found".to_owned(),
            body: "Do you want to resume from where you left off, or start over?".to_owned(),
            choices: vec!["Resume".to_owned(), "Start new".to_owned()],
        },
        StepKind::Instruction { title, body } => StepView::Choice {
            title: title.clone(),
            body: body.clone(),
            choices: vec!["BEGIN".to_owned()],
        },
        StepKind::Fixation { duration_ms } => StepView::Fixation {
            symbol: "+".to_owned(),
            duration_ms: *duration_ms,
        },
        StepKind::Comparison {
            trial,
            round_time_ms,
            index,
            total,
            ..
        } => StepView::ComparisonCards {
            title: "WHICH ONE IS LARGER?".to_owned(),
            left: trial.left().to_string(),
            right: trial.right().to_string(),
            countdown_ms: *round_time_ms,
            position: Some((*index, *total)),
        },
        StepKind::Estimation {
            trial,
            index,
            total,
            ..
        } => StepView::Slider {
            title: "PLACE IT ON THE LINE".to_owned(),
            stimulus: trial.stimulus().to_string(),
            min: 0,
            max: 100,
            start: 50,
            labels: vec!["0".to_owned(), "0.5".to_owned(), "1".to_owned()],
            require_movement: true,
            position: Some((*index, *total)),
        },
    }
}

/// End-of-study screen shown when consent is declined.
#[must_use]
pub fn declined_view() -> StepView {
    StepView::Message {
        title: "No problem".to_owned(),
        body: "You chose not to participate. You can close this page now.".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_core::model::{Phase, SidedComparison, TrialId, Value};

    #[test]
    fn comparison_cards_show_both_operands_and_the_countdown() {
        let trial = SidedComparison::new(
            TrialId::new(1),
            None,
            Value::fraction(3, 4).unwrap(),
            Value::percent(50),
        )
        .unwrap();
        let step = Step::new(StepKind::Comparison {
            trial,
            phase: Phase::Monster,
            round_time_ms: Some(5_000),
            index: 2,
            total: 5,
        });

        match view_for_step(&step) {
            StepView::ComparisonCards {
                left,
                right,
                countdown_ms,
                position,
                ..
            } => {
                assert_eq!(left, "3/4");
                assert_eq!(right, "50%");
                assert_eq!(countdown_ms, Some(5_000));
                assert_eq!(position, Some((2, 5)));
            }
            other => panic!("expected cards, got {other:?}"),
        }
    }

    #[test]
    fn slider_shape_matches_the_number_line() {
        let trial = study_core::model::EstimationTrial::new(
            TrialId::new(3),
            Value::decimal(0.35),
            None,
            None,
        )
        .unwrap();
        let step = Step::new(StepKind::Estimation {
            trial,
            phase: Phase::Pre,
            index: 1,
            total: 3,
        });

        match view_for_step(&step) {
            StepView::Slider {
                stimulus,
                min,
                max,
                start,
                labels,
                require_movement,
                ..
            } => {
                assert_eq!(stimulus, "0.35");
                assert_eq!((min, max, start), (0, 100, 50));
                assert_eq!(labels, vec!["0", "0.5", "1"]);
                assert!(require_movement);
            }
            other => panic!("expected slider, got {other:?}"),
        }
    }

    #[test]
    fn consent_offers_agree_and_decline() {
        let step = Step::new(StepKind::Consent {
            title: "Numeracy Screener".to_owned(),
        });
        match view_for_step(&step) {
            StepView::Choice { title, choices, .. } => {
                assert_eq!(title, "Numeracy Screener");
                assert_eq!(choices.len(), 2);
            }
            other => panic!("expected choice, got {other:?}"),
        }
    }
}
