use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors from constructing stimulus values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("fraction denominator must be non-zero")]
    ZeroDenominator,
}

//
// ─── NOTATION ─────────────────────────────────────────────────────────────────
//

/// Notation family a stimulus is displayed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Notation {
    Fraction,
    Decimal,
    Percentage,
}

impl Notation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Notation::Fraction => "Fraction",
            Notation::Decimal => "Decimal",
            Notation::Percentage => "Percentage",
        }
    }
}

impl fmt::Display for Notation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── VALUE ────────────────────────────────────────────────────────────────────
//

/// A magnitude stimulus in one of three notations.
///
/// The numeric magnitude is `numerator/denominator` for fractions, the raw
/// value for decimals, and `value/100` for percentages. Fractions built
/// through [`Value::fraction`] are guaranteed a non-zero denominator; code
/// constructing variants directly must uphold that invariant itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Value {
    Fraction { numerator: u32, denominator: u32 },
    Decimal { value: f64 },
    Percent { value: u32 },
}

impl Value {
    /// Builds a fraction value.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::ZeroDenominator` when `denominator` is zero.
    pub fn fraction(numerator: u32, denominator: u32) -> Result<Self, ValueError> {
        if denominator == 0 {
            return Err(ValueError::ZeroDenominator);
        }
        Ok(Self::Fraction {
            numerator,
            denominator,
        })
    }

    /// Builds a decimal value.
    #[must_use]
    pub fn decimal(value: f64) -> Self {
        Self::Decimal { value }
    }

    /// Builds a percentage value.
    #[must_use]
    pub fn percent(value: u32) -> Self {
        Self::Percent { value }
    }

    /// Numeric magnitude of this value on the real line.
    #[must_use]
    pub fn numeric(&self) -> f64 {
        match self {
            Value::Fraction {
                numerator,
                denominator,
            } => f64::from(*numerator) / f64::from(*denominator),
            Value::Decimal { value } => *value,
            Value::Percent { value } => f64::from(*value) / 100.0,
        }
    }

    /// Notation family this value is displayed in.
    #[must_use]
    pub fn notation(&self) -> Notation {
        match self {
            Value::Fraction { .. } => Notation::Fraction,
            Value::Decimal { .. } => Notation::Decimal,
            Value::Percent { .. } => Notation::Percentage,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Fraction {
                numerator,
                denominator,
            } => write!(f, "{numerator}/{denominator}"),
            Value::Decimal { value } => write!(f, "{value}"),
            Value::Percent { value } => write!(f, "{value}%"),
        }
    }
}

//
// ─── TESTS ────────────────────────────────────────────────────────────────────
//
