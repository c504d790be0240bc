//! Transaction orchestrator
//!
//! Front door for inbound transactions: drives each request through
//! scoring, decision dispatch, and posting, serialized per transaction id.
//! Every submission resolves to exactly one outcome; resubmitting a
//! completed id replays the recorded outcome instead of re-running the flow.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod outcome;
pub mod request;
pub mod state;

pub use config::RetryConfig;
pub use error::OrchestratorError;
pub use orchestrator::Orchestrator;
pub use outcome::TransactionOutcome;
pub use request::{LegRequest, TransactionRequest};
pub use state::OrchestrationState;
