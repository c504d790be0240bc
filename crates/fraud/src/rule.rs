//! Rule contract

use std::collections::HashMap;

use async_trait::async_trait;
use finledger_core::SubjectKey;
use finledger_signals::SignalSnapshot;
use thiserror::Error;

use crate::context::EvaluationContext;

/// Errors inside a single rule. Isolated by the engine: a failing rule
/// abstains from the aggregate, it never fails the evaluation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("Rule evaluation failed: {0}")]
    Evaluation(String),
}

/// One rule's contribution to the aggregate score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleScore {
    /// Score in [0, 1]
    pub score: f64,
    /// Whether the rule considers its condition met
    pub fired: bool,
}

impl RuleScore {
    /// The rule found nothing suspicious
    pub fn clear() -> Self {
        Self {
            score: 0.0,
            fired: false,
        }
    }

    /// The rule's condition was met with the given score
    pub fn fired(score: f64) -> Self {
        Self {
            score: score.clamp(0.0, 1.0),
            fired: true,
        }
    }
}

/// Snapshots prefetched for the transaction's subjects.
///
/// A missing subject reads as baseline; rules must treat absence as a cold
/// subject, never as an error.
#[derive(Debug, Clone, Default)]
pub struct SignalView {
    snapshots: HashMap<SubjectKey, SignalSnapshot>,
}

impl SignalView {
    /// View with no signals at all (cache outage under fail-open)
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, subject: SubjectKey, snapshot: SignalSnapshot) {
        self.snapshots.insert(subject, snapshot);
    }

    pub fn for_subject(&self, subject: &SubjectKey) -> Option<&SignalSnapshot> {
        self.snapshots.get(subject)
    }
}

/// A fraud rule: a capability, not a base class.
///
/// Implementations must be side-effect free with respect to the signal
/// cache; the engine owns all cache writes.
#[async_trait]
pub trait FraudRule: Send + Sync {
    /// Stable identifier, reported in `fired_rules`
    fn id(&self) -> &'static str;

    async fn evaluate(
        &self,
        ctx: &EvaluationContext,
        signals: &SignalView,
    ) -> Result<RuleScore, RuleError>;
}
