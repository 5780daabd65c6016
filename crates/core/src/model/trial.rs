use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::ids::TrialId;
use crate::model::value::{Notation, Value};

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors from constructing comparison trials.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrialError {
    #[error("comparison operands are numerically tied at {0}")]
    TiedOperands(f64),
}

//
// ─── TAGS ─────────────────────────────────────────────────────────────────────
//

/// Which display position holds an operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Instructional block an authored trial belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Block {
    #[serde(rename = "Pre-Instruction")]
    PreInstruction,
    #[serde(rename = "Post-Instruction")]
    PostInstruction,
}

/// Whether the two operands share a notation family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    #[serde(rename = "within")]
    WithinNotation,
    #[serde(rename = "cross")]
    CrossNotation,
}

impl Relation {
    #[must_use]
    pub fn between(a: Notation, b: Notation) -> Self {
        if a == b {
            Relation::WithinNotation
        } else {
            Relation::CrossNotation
        }
    }
}

//
// ─── COMPARISON TRIAL ─────────────────────────────────────────────────────────
//

/// An authored magnitude-comparison item before left/right assignment.
///
/// The operand pair is stored in authoring order; presentation order is
/// decided per run by [`ComparisonTrial::with_sides`]. The pair is never
/// numerically tied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonTrial {
    id: TrialId,
    block: Block,
    first: Value,
    second: Value,
}

impl ComparisonTrial {
    /// Builds an authored comparison trial.
    ///
    /// # Errors
    ///
    /// Returns `TrialError::TiedOperands` when both operands have the same
    /// numeric magnitude.
    pub fn new(id: TrialId, block: Block, first: Value, second: Value) -> Result<Self, TrialError> {
        if first.numeric() == second.numeric() {
            return Err(TrialError::TiedOperands(first.numeric()));
        }
        Ok(Self {
            id,
            block,
            first,
            second,
        })
    }

    #[must_use]
    pub fn id(&self) -> TrialId {
        self.id
    }

    #[must_use]
    pub fn block(&self) -> Block {
        self.block
    }

    #[must_use]
    pub fn first(&self) -> Value {
        self.first
    }

    #[must_use]
    pub fn second(&self) -> Value {
        self.second
    }

    /// Absolute numeric distance between the operands.
    #[must_use]
    pub fn distance(&self) -> f64 {
        (self.first.numeric() - self.second.numeric()).abs()
    }

    /// Within- or cross-notation classification of the pair.
    #[must_use]
    pub fn relation(&self) -> Relation {
        Relation::between(self.first.notation(), self.second.notation())
    }

    /// Assigns display sides.
    ///
    /// `swap = false` keeps authoring order, `swap = true` mirrors it; the
    /// correct side is recomputed after the permutation.
    #[must_use]
    pub fn with_sides(&self, swap: bool) -> SidedComparison {
        let (left, right) = if swap {
            (self.second, self.first)
        } else {
            (self.first, self.second)
        };
        SidedComparison::from_untied(self.id, Some(self.block), left, right)
    }
}

//
// ─── SIDED COMPARISON ─────────────────────────────────────────────────────────
//

/// A comparison trial after left/right assignment, ready for presentation.
///
/// `correct_side` always names the side whose operand has the strictly
/// greater numeric magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SidedComparison {
    trial_id: TrialId,
    block: Option<Block>,
    left: Value,
    right: Value,
    correct_side: Side,
}

impl SidedComparison {
    /// Builds a sided comparison from an explicit left/right pair.
    ///
    /// # Errors
    ///
    /// Returns `TrialError::TiedOperands` when both operands have the same
    /// numeric magnitude.
    pub fn new(
        trial_id: TrialId,
        block: Option<Block>,
        left: Value,
        right: Value,
    ) -> Result<Self, TrialError> {
        if left.numeric() == right.numeric() {
            return Err(TrialError::TiedOperands(left.numeric()));
        }
        Ok(Self::from_untied(trial_id, block, left, right))
    }

    fn from_untied(trial_id: TrialId, block: Option<Block>, left: Value, right: Value) -> Self {
        let correct_side = if left.numeric() > right.numeric() {
            Side::Left
        } else {
            Side::Right
        };
        Self {
            trial_id,
            block,
            left,
            right,
            correct_side,
        }
    }

    #[must_use]
    pub fn trial_id(&self) -> TrialId {
        self.trial_id
    }

    #[must_use]
    pub fn block(&self) -> Option<Block> {
        self.block
    }

    #[must_use]
    pub fn left(&self) -> Value {
        self.left
    }

    #[must_use]
    pub fn right(&self) -> Value {
        self.right
    }

    #[must_use]
    pub fn correct_side(&self) -> Side {
        self.correct_side
    }

    /// Operand displayed on the given side.
    #[must_use]
    pub fn on_side(&self, side: Side) -> Value {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    /// Absolute numeric distance between the operands.
    #[must_use]
    pub fn distance(&self) -> f64 {
        (self.left.numeric() - self.right.numeric()).abs()
    }

    /// Within- or cross-notation classification of the pair.
    #[must_use]
    pub fn relation(&self) -> Relation {
        Relation::between(self.left.notation(), self.right.notation())
    }
}

//
// ─── TESTS ────────────────────────────────────────────────────────────────────
//
