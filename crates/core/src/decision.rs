//! Risk decisions with ordered severity
//!
//! `Allow < Hold < Reject`: comparing decisions compares restrictiveness.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Outcome of a fraud evaluation - ordered from least to most restrictive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allow = 0,
    Hold = 1,
    Reject = 2,
}

impl PartialOrd for Decision {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Decision {
    fn cmp(&self, other: &Self) -> Ordering {
        (*self as u8).cmp(&(*other as u8))
    }
}

/// Immutable result of scoring one transaction.
///
/// Attached to the transaction for audit and never reused across
/// transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskDecision {
    /// Aggregated score in [0, 1]
    pub score: f64,
    /// Threshold-mapped decision
    pub decision: Decision,
    /// Identifiers of the rules that fired
    pub fired_rules: Vec<String>,
    /// When the evaluation completed
    pub evaluated_at: DateTime<Utc>,
}

impl RiskDecision {
    pub fn new(score: f64, decision: Decision, fired_rules: Vec<String>) -> Self {
        Self {
            score,
            decision,
            fired_rules,
            evaluated_at: Utc::now(),
        }
    }

    /// A zero-score Allow decision with no fired rules
    pub fn allow() -> Self {
        Self::new(0.0, Decision::Allow, Vec::new())
    }

    pub fn is_allowed(&self) -> bool {
        self.decision == Decision::Allow
    }

    pub fn is_held(&self) -> bool {
        self.decision == Decision::Hold
    }

    pub fn is_rejected(&self) -> bool {
        self.decision == Decision::Reject
    }
}
