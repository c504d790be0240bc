//! Signal snapshots and deltas

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Rolling-window aggregate of a subject's recent activity.
///
/// Disposable and eventually consistent: losing a snapshot degrades scoring
/// quality, never correctness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSnapshot {
    /// Transactions observed in the current window
    pub count: u64,
    /// Sum of observed transaction amounts
    pub total: Decimal,
    pub window_started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SignalSnapshot {
    pub fn baseline() -> Self {
        let now = Utc::now();
        Self {
            count: 0,
            total: Decimal::ZERO,
            window_started_at: now,
            updated_at: now,
        }
    }

    /// Mean observed amount, `None` for a cold subject
    pub fn mean_amount(&self) -> Option<Decimal> {
        if self.count == 0 {
            None
        } else {
            Some(self.total / Decimal::from(self.count))
        }
    }

    /// Merge a delta. Commutative, so concurrent increments applied in any
    /// order converge to the same aggregate.
    pub fn merged(&self, delta: &SignalDelta) -> Self {
        Self {
            count: self.count + delta.count,
            total: self.total + delta.amount,
            window_started_at: self.window_started_at,
            updated_at: Utc::now(),
        }
    }
}

/// Increment to apply to a subject's snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalDelta {
    pub count: u64,
    pub amount: Decimal,
}

impl SignalDelta {
    /// One observed transaction of the given amount
    pub fn observation(amount: Decimal) -> Self {
        Self { count: 1, amount }
    }
}
