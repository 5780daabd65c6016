//! Random stimulus generation for comparison trials.
//!
//! Operand ranges follow the study protocol: fraction terms are uniform
//! over 1-9, decimals uniform over [0,1) rounded to two places, percents
//! uniform over 1-100.

use rand::Rng;

use study_core::model::{ComparisonTrial, Notation, SidedComparison, TrialError, TrialId, Value};

/// How many fresh draws a tied pair gets before the deterministic nudge.
pub const MAX_TIE_RETRIES: u32 = 16;

/// The six operand pairings a generated comparison can draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonCategory {
    DecimalFraction,
    DecimalPercent,
    DecimalDecimal,
    FractionPercent,
    FractionFraction,
    PercentPercent,
}

impl ComparisonCategory {
    pub const ALL: [Self; 6] = [
        Self::DecimalFraction,
        Self::DecimalPercent,
        Self::DecimalDecimal,
        Self::FractionPercent,
        Self::FractionFraction,
        Self::PercentPercent,
    ];

    /// Notations of the two operands, in draw order.
    #[must_use]
    pub fn operands(self) -> (Notation, Notation) {
        match self {
            Self::DecimalFraction => (Notation::Decimal, Notation::Fraction),
            Self::DecimalPercent => (Notation::Decimal, Notation::Percentage),
            Self::DecimalDecimal => (Notation::Decimal, Notation::Decimal),
            Self::FractionPercent => (Notation::Fraction, Notation::Percentage),
            Self::FractionFraction => (Notation::Fraction, Notation::Fraction),
            Self::PercentPercent => (Notation::Percentage, Notation::Percentage),
        }
    }
}

/// Draws a random stimulus value in the given notation.
pub fn random_value(rng: &mut impl Rng, notation: Notation) -> Value {
    match notation {
        Notation::Fraction => Value::Fraction {
            numerator: rng.random_range(1..=9),
            denominator: rng.random_range(1..=9),
        },
        Notation::Decimal => {
            let raw: f64 = rng.random();
            Value::decimal((raw * 100.0).round() / 100.0)
        }
        Notation::Percentage => Value::percent(rng.random_range(1..=100)),
    }
}

/// Perturbs a value by its smallest display unit, away from a tie.
fn nudge(value: Value) -> Value {
    match value {
        Value::Decimal { value } => Value::decimal(if value >= 0.99 {
            value - 0.01
        } else {
            value + 0.01
        }),
        Value::Percent { value } => Value::percent(if value >= 100 { value - 1 } else { value + 1 }),
        Value::Fraction {
            numerator,
            denominator,
        } => Value::Fraction {
            numerator: if numerator >= 9 {
                numerator - 1
            } else {
                numerator + 1
            },
            denominator,
        },
    }
}

/// A freshly generated comparison with its category tag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneratedComparison {
    pub category: ComparisonCategory,
    pub trial: SidedComparison,
}

/// Generates one comparison trial with randomized sides.
///
/// Tied operand pairs are redrawn up to [`MAX_TIE_RETRIES`] times; if the
/// stream keeps colliding, one operand is nudged by a single display unit
/// so generation always terminates.
pub fn generate_comparison(rng: &mut impl Rng, trial_id: TrialId) -> GeneratedComparison {
    let category = ComparisonCategory::ALL[rng.random_range(0..ComparisonCategory::ALL.len())];
    let (first_notation, second_notation) = category.operands();

    let mut first = random_value(rng, first_notation);
    let mut second = random_value(rng, second_notation);
    for _ in 0..MAX_TIE_RETRIES {
        if first.numeric() != second.numeric() {
            break;
        }
        first = random_value(rng, first_notation);
        second = random_value(rng, second_notation);
    }

    let (left, mut right) = if rng.random_bool(0.5) {
        (second, first)
    } else {
        (first, second)
    };

    let trial = loop {
        match SidedComparison::new(trial_id, None, left, right) {
            Ok(trial) => break trial,
            // Still tied after all retries: break the tie by one unit.
            Err(TrialError::TiedOperands(_)) => right = nudge(right),
        }
    };

    GeneratedComparison { category, trial }
}

/// Randomly permutes which operand of an authored trial shows left.
pub fn randomize_sides(rng: &mut impl Rng, trial: &ComparisonTrial) -> SidedComparison {
    trial.with_sides(rng.random_bool(0.5))
}
