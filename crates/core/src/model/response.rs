use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::estimation::EstimationTrial;
use crate::model::ids::TrialId;
use crate::model::trial::{Block, Relation, Side, SidedComparison};
use crate::model::value::{Notation, Value};

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors from recording participant responses.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ResponseError {
    #[error("estimate {0} is not a position on the 0-1 line")]
    InvalidEstimate(f64),
}

//
// ─── PHASE ────────────────────────────────────────────────────────────────────
//

/// Which part of the run a response belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Pre,
    Monster,
    Post,
}

impl Phase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Pre => "pre",
            Phase::Monster => "monster",
            Phase::Post => "post",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── COMPARISON OBSERVATION ───────────────────────────────────────────────────
//

/// One answered (or missed) magnitude-comparison trial.
///
/// `chosen` is `None` when the trial timed out or was abandoned; such
/// trials count as wrong. Append-only raw data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonObservation {
    pub trial_id: TrialId,
    pub phase: Phase,
    pub block: Option<Block>,
    pub left: Value,
    pub right: Value,
    pub distance: f64,
    pub relation: Relation,
    pub correct_side: Side,
    pub chosen: Option<Side>,
    pub correct: bool,
    pub rt_ms: Option<u32>,
}

impl ComparisonObservation {
    /// Records a choice for the given trial.
    #[must_use]
    pub fn answered(trial: &SidedComparison, phase: Phase, chosen: Side, rt_ms: u32) -> Self {
        Self {
            trial_id: trial.trial_id(),
            phase,
            block: trial.block(),
            left: trial.left(),
            right: trial.right(),
            distance: trial.distance(),
            relation: trial.relation(),
            correct_side: trial.correct_side(),
            chosen: Some(chosen),
            correct: chosen == trial.correct_side(),
            rt_ms: Some(rt_ms),
        }
    }

    /// Records a trial that expired without a choice.
    #[must_use]
    pub fn missed(trial: &SidedComparison, phase: Phase) -> Self {
        Self {
            trial_id: trial.trial_id(),
            phase,
            block: trial.block(),
            left: trial.left(),
            right: trial.right(),
            distance: trial.distance(),
            relation: trial.relation(),
            correct_side: trial.correct_side(),
            chosen: None,
            correct: false,
            rt_ms: None,
        }
    }
}

//
// ─── ESTIMATION OBSERVATION ───────────────────────────────────────────────────
//

/// One submitted number-line estimation trial.
///
/// Percent absolute error and directional error are derived once at
/// recording time and re-derivable from the stored raw fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationObservation {
    pub trial_id: TrialId,
    pub phase: Phase,
    pub block: Option<Block>,
    pub notation: Notation,
    pub true_value: f64,
    pub estimate: f64,
    pub pae: f64,
    pub directional: f64,
    pub rt_ms: Option<u32>,
}

impl EstimationObservation {
    /// Records an estimate for the given trial.
    ///
    /// # Errors
    ///
    /// Returns `ResponseError::InvalidEstimate` when `estimate` is not a
    /// finite position in [0,1].
    pub fn new(
        trial: &EstimationTrial,
        phase: Phase,
        estimate: f64,
        rt_ms: Option<u32>,
    ) -> Result<Self, ResponseError> {
        if !estimate.is_finite() || !(0.0..=1.0).contains(&estimate) {
            return Err(ResponseError::InvalidEstimate(estimate));
        }
        let true_value = trial.true_value();
        Ok(Self {
            trial_id: trial.id(),
            phase,
            block: trial.block(),
            notation: trial.notation(),
            true_value,
            estimate,
            pae: (estimate - true_value).abs() * 100.0,
            directional: estimate - true_value,
            rt_ms,
        })
    }
}

//
// ─── RESPONSE RECORD ──────────────────────────────────────────────────────────
//

/// Tagged raw-data record for one completed trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "task")]
pub enum ResponseRecord {
    #[serde(rename = "magnitude_compare")]
    Comparison(ComparisonObservation),
    #[serde(rename = "number_line_estimation")]
    Estimation(EstimationObservation),
}

impl ResponseRecord {
    #[must_use]
    pub fn phase(&self) -> Phase {
        match self {
            ResponseRecord::Comparison(obs) => obs.phase,
            ResponseRecord::Estimation(obs) => obs.phase,
        }
    }

    #[must_use]
    pub fn as_comparison(&self) -> Option<&ComparisonObservation> {
        match self {
            ResponseRecord::Comparison(obs) => Some(obs),
            ResponseRecord::Estimation(_) => None,
        }
    }

    #[must_use]
    pub fn as_estimation(&self) -> Option<&EstimationObservation> {
        match self {
            ResponseRecord::Comparison(_) => None,
            ResponseRecord::Estimation(obs) => Some(obs),
        }
    }
}

//
// ─── TESTS ────────────────────────────────────────────────────────────────────
//
