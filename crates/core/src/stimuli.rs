//! Authored protocol stimuli.
//!
//! The comparison pool mixes within- and cross-notation pairs at varied
//! numeric distances, split across the pre- and post-instruction blocks.
//! The estimation pool covers all three notations on the 0-1 line.

use crate::model::estimation::{Difficulty, EstimationTrial};
use crate::model::ids::TrialId;
use crate::model::trial::{Block, ComparisonTrial};
use crate::model::value::Value;

fn fraction(numerator: u32, denominator: u32) -> Value {
    Value::fraction(numerator, denominator).expect("authored fraction has a non-zero denominator")
}

/// The authored magnitude-comparison trial set.
#[must_use]
pub fn comparison_pool() -> Vec<ComparisonTrial> {
    let trial = |id: u32, block: Block, first: Value, second: Value| {
        ComparisonTrial::new(TrialId::new(id), block, first, second)
            .expect("authored comparison operands must differ")
    };

    vec![
        trial(1, Block::PreInstruction, fraction(3, 4), Value::decimal(0.5)),
        trial(2, Block::PreInstruction, Value::decimal(0.25), fraction(2, 5)),
        trial(3, Block::PreInstruction, Value::percent(60), Value::decimal(0.55)),
        trial(4, Block::PreInstruction, fraction(1, 3), Value::percent(40)),
        trial(5, Block::PreInstruction, Value::decimal(0.7), Value::decimal(0.65)),
        trial(6, Block::PreInstruction, fraction(2, 3), fraction(3, 5)),
        trial(7, Block::PreInstruction, Value::percent(45), Value::percent(54)),
        trial(8, Block::PreInstruction, fraction(7, 8), Value::percent(80)),
        trial(9, Block::PostInstruction, Value::decimal(0.6), fraction(2, 3)),
        trial(10, Block::PostInstruction, Value::decimal(0.85), Value::percent(75)),
        trial(11, Block::PostInstruction, Value::decimal(0.4), Value::decimal(0.35)),
        trial(12, Block::PostInstruction, fraction(1, 4), Value::percent(30)),
        trial(13, Block::PostInstruction, fraction(5, 6), fraction(4, 5)),
        trial(14, Block::PostInstruction, Value::percent(20), Value::percent(15)),
        trial(15, Block::PostInstruction, Value::decimal(0.9), fraction(8, 9)),
        trial(16, Block::PostInstruction, fraction(3, 8), Value::decimal(0.42)),
    ]
}

/// The authored number-line estimation trial set.
#[must_use]
pub fn estimation_pool() -> Vec<EstimationTrial> {
    let trial = |id: u32, stimulus: Value, block: Block| {
        let difficulty = if stimulus.numeric() < 0.5 {
            Difficulty::Small
        } else {
            Difficulty::Large
        };
        EstimationTrial::new(TrialId::new(id), stimulus, Some(block), Some(difficulty))
            .expect("authored estimation stimulus lies on the 0-1 line")
    };

    vec![
        trial(1, fraction(13, 20), Block::PreInstruction),
        trial(2, Value::decimal(0.35), Block::PreInstruction),
        trial(3, Value::percent(35), Block::PreInstruction),
        trial(4, fraction(7, 10), Block::PostInstruction),
        trial(5, Value::decimal(0.48), Block::PostInstruction),
        trial(6, Value::percent(65), Block::PostInstruction),
    ]
}
