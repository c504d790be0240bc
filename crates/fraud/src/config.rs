//! Scoring configuration

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How the engine degrades when signals cannot be obtained in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailPolicy {
    /// Degraded signals score as harmless; availability over strictness
    FailOpen,
    /// Degraded signals score as maximally suspicious; a false positive is
    /// preferred over a false negative
    FailClosed,
}

impl Default for FailPolicy {
    fn default() -> Self {
        FailPolicy::FailClosed
    }
}

impl FailPolicy {
    /// Score a timed-out rule contributes
    pub fn timeout_score(&self) -> f64 {
        match self {
            FailPolicy::FailOpen => 0.0,
            FailPolicy::FailClosed => 1.0,
        }
    }
}

/// Thresholds, weights, and time budgets for one scoring engine.
///
/// The rule set itself is registered in code; weights address rules by id so
/// operators can retune without redeploying.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Scores below this allow the transaction
    #[serde(default = "default_t1")]
    pub t1: f64,
    /// Scores at or above this reject it; in between holds it
    #[serde(default = "default_t2")]
    pub t2: f64,
    /// Per-rule weight by rule id; unlisted rules weigh 1.0
    #[serde(default)]
    pub weights: HashMap<String, f64>,
    #[serde(default = "default_rule_timeout_ms")]
    pub rule_timeout_ms: u64,
    #[serde(default = "default_overall_deadline_ms")]
    pub overall_deadline_ms: u64,
    #[serde(default)]
    pub fail_policy: FailPolicy,
}

fn default_t1() -> f64 {
    0.5
}

fn default_t2() -> f64 {
    0.8
}

fn default_rule_timeout_ms() -> u64 {
    100
}

fn default_overall_deadline_ms() -> u64 {
    500
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            t1: default_t1(),
            t2: default_t2(),
            weights: HashMap::new(),
            rule_timeout_ms: default_rule_timeout_ms(),
            overall_deadline_ms: default_overall_deadline_ms(),
            fail_policy: FailPolicy::default(),
        }
    }
}

impl ScoringConfig {
    pub fn weight_for(&self, rule_id: &str) -> f64 {
        self.weights.get(rule_id).copied().unwrap_or(1.0)
    }

    pub fn rule_timeout(&self) -> Duration {
        Duration::from_millis(self.rule_timeout_ms)
    }

    pub fn overall_deadline(&self) -> Duration {
        Duration::from_millis(self.overall_deadline_ms)
    }
}
