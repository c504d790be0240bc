//! Orchestration state machine

use serde::{Deserialize, Serialize};

/// Lifecycle of one submission through the orchestrator.
///
/// `Posted`, `Held`, and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrchestrationState {
    Received,
    Scoring,
    Allowed,
    Posting,
    Posted,
    Held,
    Rejected,
}

impl OrchestrationState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrchestrationState::Posted | OrchestrationState::Held | OrchestrationState::Rejected
        )
    }

    /// Exhaustive legal-transition table
    pub fn can_transition_to(&self, next: OrchestrationState) -> bool {
        use OrchestrationState::*;
        match (self, next) {
            (Received, Scoring) => true,
            (Scoring, Allowed) | (Scoring, Held) | (Scoring, Rejected) => true,
            (Allowed, Posting) => true,
            (Posting, Posted) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrchestrationState::*;

    #[test]
    fn test_happy_path() {
        assert!(Received.can_transition_to(Scoring));
        assert!(Scoring.can_transition_to(Allowed));
        assert!(Allowed.can_transition_to(Posting));
        assert!(Posting.can_transition_to(Posted));
    }

    #[test]
    fn test_scoring_branches() {
        assert!(Scoring.can_transition_to(Held));
        assert!(Scoring.can_transition_to(Rejected));
        assert!(!Scoring.can_transition_to(Posted));
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for terminal in [Posted, Held, Rejected] {
            assert!(terminal.is_terminal());
            for next in [Received, Scoring, Allowed, Posting, Posted, Held, Rejected] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_no_skipping_scoring() {
        assert!(!Received.can_transition_to(Allowed));
        assert!(!Received.can_transition_to(Posting));
        assert!(!Allowed.can_transition_to(Posted));
    }
}
