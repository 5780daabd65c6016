use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{ParticipantId, RunId, UserId};
use crate::model::response::{Phase, ResponseRecord};

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SummaryError {
    #[error("too many records for a single phase: {len}")]
    TooManyRecords { len: usize },

    #[error("correct count ({correct}) exceeds total ({total})")]
    CountMismatch { total: u32, correct: u32 },
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let count = u32::try_from(values.len()).ok()?;
    Some(values.iter().sum::<f64>() / f64::from(count))
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

//
// ─── COMPARISON SUMMARY ───────────────────────────────────────────────────────
//

/// Aggregate over the comparison trials of one phase.
///
/// Recomputed on demand from the raw records, never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub total: u32,
    pub correct: u32,
    pub accuracy: Option<f64>,
    #[serde(rename = "meanRT_ms")]
    pub mean_rt_ms: Option<f64>,
}

impl ComparisonSummary {
    /// Builds a summary from validated counts.
    ///
    /// # Errors
    ///
    /// Returns `SummaryError::CountMismatch` if `correct` exceeds `total`.
    pub fn from_parts(
        total: u32,
        correct: u32,
        mean_rt_ms: Option<f64>,
    ) -> Result<Self, SummaryError> {
        if correct > total {
            return Err(SummaryError::CountMismatch { total, correct });
        }
        let accuracy = (total > 0).then(|| f64::from(correct) / f64::from(total));
        Ok(Self {
            total,
            correct,
            accuracy,
            mean_rt_ms,
        })
    }

    /// Aggregates the comparison records tagged with `phase`.
    ///
    /// # Errors
    ///
    /// Returns `SummaryError::TooManyRecords` if the count cannot fit in `u32`.
    pub fn from_records(phase: Phase, records: &[ResponseRecord]) -> Result<Self, SummaryError> {
        let observations: Vec<_> = records
            .iter()
            .filter_map(ResponseRecord::as_comparison)
            .filter(|obs| obs.phase == phase)
            .collect();

        let total = u32::try_from(observations.len()).map_err(|_| SummaryError::TooManyRecords {
            len: observations.len(),
        })?;
        let correct = u32::try_from(observations.iter().filter(|obs| obs.correct).count())
            .map_err(|_| SummaryError::TooManyRecords {
                len: observations.len(),
            })?;

        let rt_values: Vec<f64> = observations
            .iter()
            .filter_map(|obs| obs.rt_ms.map(f64::from))
            .collect();
        let mean_rt_ms = mean(&rt_values).map(|m| round_to(m, 0));

        Self::from_parts(total, correct, mean_rt_ms)
    }
}

//
// ─── ESTIMATION SUMMARY ───────────────────────────────────────────────────────
//

/// Aggregate over the number-line estimation trials of one phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationSummary {
    pub total: u32,
    #[serde(rename = "meanPAE")]
    pub mean_pae: Option<f64>,
    #[serde(rename = "meanDirectionalError")]
    pub mean_directional: Option<f64>,
}

impl EstimationSummary {
    /// Aggregates the estimation records tagged with `phase`.
    ///
    /// # Errors
    ///
    /// Returns `SummaryError::TooManyRecords` if the count cannot fit in `u32`.
    pub fn from_records(phase: Phase, records: &[ResponseRecord]) -> Result<Self, SummaryError> {
        let observations: Vec<_> = records
            .iter()
            .filter_map(ResponseRecord::as_estimation)
            .filter(|obs| obs.phase == phase)
            .collect();

        let total = u32::try_from(observations.len()).map_err(|_| SummaryError::TooManyRecords {
            len: observations.len(),
        })?;

        let pae_values: Vec<f64> = observations.iter().map(|obs| obs.pae).collect();
        let directional_values: Vec<f64> = observations.iter().map(|obs| obs.directional).collect();

        Ok(Self {
            total,
            mean_pae: mean(&pae_values).map(|m| round_to(m, 2)),
            mean_directional: mean(&directional_values).map(|m| round_to(m, 4)),
        })
    }
}

//
// ─── PHASE OUTCOME ────────────────────────────────────────────────────────────
//

/// Both task summaries for a single phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseOutcome {
    pub comparison: ComparisonSummary,
    pub estimation: EstimationSummary,
}

impl PhaseOutcome {
    /// Aggregates both task summaries for `phase`.
    ///
    /// # Errors
    ///
    /// Propagates `SummaryError` from either aggregation.
    pub fn from_records(phase: Phase, records: &[ResponseRecord]) -> Result<Self, SummaryError> {
        Ok(Self {
            comparison: ComparisonSummary::from_records(phase, records)?,
            estimation: EstimationSummary::from_records(phase, records)?,
        })
    }
}

//
// ─── RUN RESULT ───────────────────────────────────────────────────────────────
//

/// Completed-run report handed to the results sink.
///
/// When a run was resumed, the pre-phase summaries are the ones loaded
/// from the checkpoint rather than recomputed from in-run records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub run_id: RunId,
    pub consented: bool,
    pub participant_id: Option<ParticipantId>,
    pub operator_uid: Option<UserId>,
    pub resumed: bool,
    pub pre: PhaseOutcome,
    pub post: PhaseOutcome,
    pub completed_at: DateTime<Utc>,
}

//
// ─── TESTS ────────────────────────────────────────────────────────────────────
//
