//! Fraud scoring engine
//!
//! Scores a proposed transaction against a configured set of rules before
//! it may post. Rules run concurrently, each under its own timeout; the
//! engine aggregates their scores into a single `RiskDecision`. Failures
//! degrade per the configured fail policy rather than surfacing to callers.

pub mod config;
pub mod context;
pub mod engine;
pub mod rule;
pub mod rules;

pub use config::{FailPolicy, ScoringConfig};
pub use context::EvaluationContext;
pub use engine::ScoringEngine;
pub use rule::{FraudRule, RuleError, RuleScore, SignalView};
