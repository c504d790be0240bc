//! Monetary amount magnitudes
//!
//! A posted amount is a non-negative magnitude; direction is carried by the
//! entry side (debit/credit), so signs never appear on amounts themselves.
//! Scale is bounded so per-currency sums across entries stay exact: an
//! amount may carry at most `Amount::MAX_SCALE` fractional digits.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors from amount construction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount cannot be negative: {0}")]
    Negative(Decimal),

    #[error("Amount {value} carries more than {max_scale} fractional digits")]
    ScaleTooFine { value: Decimal, max_scale: u32 },
}

/// A validated monetary magnitude.
///
/// # Invariants
/// Non-negative, with at most [`Amount::MAX_SCALE`] fractional digits
/// (trailing zeros do not count). Both are enforced by the constructor.
///
/// # Example
/// ```
/// use finledger_core::Amount;
/// use rust_decimal::Decimal;
///
/// let amount = Amount::new(Decimal::new(12345, 2))?; // 123.45
/// assert_eq!(amount.value(), Decimal::new(12345, 2));
///
/// assert!(Amount::new(Decimal::new(-100, 0)).is_err());
/// # Ok::<(), finledger_core::AmountError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Finest fractional resolution the ledger records.
    ///
    /// Covers every fiat minor unit plus sub-cent pricing; anything finer
    /// is a caller bug, not a rounding candidate.
    pub const MAX_SCALE: u32 = 8;

    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value < Decimal::ZERO {
            return Err(AmountError::Negative(value));
        }
        // normalize() drops trailing zeros so 1.50000000 and 1.5 agree
        if value.normalize().scale() > Self::MAX_SCALE {
            return Err(AmountError::ScaleTooFine {
                value,
                max_scale: Self::MAX_SCALE,
            });
        }
        Ok(Self(value))
    }

    /// The inner decimal magnitude
    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}
