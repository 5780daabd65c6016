use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::TrialId;
use crate::model::trial::Block;
use crate::model::value::{Notation, Value};

/// Errors from constructing estimation trials.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EstimationError {
    #[error("stimulus magnitude {0} falls outside the 0-1 number line")]
    OutOfRange(f64),
}

/// Magnitude band of an estimation stimulus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Small,
    Large,
}

/// A number-line estimation item.
///
/// The participant places the displayed stimulus on a 0-1 line; the ground
/// truth is the stimulus' own numeric magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimationTrial {
    id: TrialId,
    stimulus: Value,
    true_value: f64,
    block: Option<Block>,
    difficulty: Option<Difficulty>,
}

impl EstimationTrial {
    /// Builds an estimation trial from its display stimulus.
    ///
    /// # Errors
    ///
    /// Returns `EstimationError::OutOfRange` when the stimulus magnitude is
    /// not a position on the unit line.
    pub fn new(
        id: TrialId,
        stimulus: Value,
        block: Option<Block>,
        difficulty: Option<Difficulty>,
    ) -> Result<Self, EstimationError> {
        let true_value = stimulus.numeric();
        if !true_value.is_finite() || !(0.0..=1.0).contains(&true_value) {
            return Err(EstimationError::OutOfRange(true_value));
        }
        Ok(Self {
            id,
            stimulus,
            true_value,
            block,
            difficulty,
        })
    }

    #[must_use]
    pub fn id(&self) -> TrialId {
        self.id
    }

    #[must_use]
    pub fn stimulus(&self) -> Value {
        self.stimulus
    }

    /// Ground-truth magnitude in [0,1].
    #[must_use]
    pub fn true_value(&self) -> f64 {
        self.true_value
    }

    #[must_use]
    pub fn notation(&self) -> Notation {
        self.stimulus.notation()
    }

    #[must_use]
    pub fn block(&self) -> Option<Block> {
        self.block
    }

    #[must_use]
    pub fn difficulty(&self) -> Option<Difficulty> {
        self.difficulty
    }
}
