//! Connection state machine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of the platform connection
///
/// ```text
/// Initializing ──qr──────────▶ AwaitingAuthentication ──authenticated──▶ Ready
///      │  └──────────stored session resumes──────────────────────────────▶ │
///      │                                                                   │
///      └──connect error──▶ Disconnected ◀──────────transport drop──────────┘
///                              │  ▲
///                    retry     ▼  │ retry fails
///                          Initializing ... ──retries exhausted──▶ Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Initializing,
    AwaitingAuthentication,
    Ready,
    Disconnected,
    Failed,
}

impl ConnectionState {
    /// Whether the state machine allows moving from `self` to `next`.
    ///
    /// Staying in the same state is always allowed except for `Failed`,
    /// which is terminal.
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;

        match (self, next) {
            (Failed, _) => false,
            (_, Failed) => true,
            (a, b) if a == b => true,
            (Initializing, AwaitingAuthentication | Ready | Disconnected) => true,
            (AwaitingAuthentication, Ready | Initializing | Disconnected) => true,
            (Ready, Disconnected) => true,
            (Disconnected, Initializing) => true,
            _ => false,
        }
    }

    /// Only a ready connection may process inbound commands
    pub fn accepts_messages(self) -> bool {
        self == ConnectionState::Ready
    }

    pub fn is_terminal(self) -> bool {
        self == ConnectionState::Failed
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionState::Initializing => "initializing",
            ConnectionState::AwaitingAuthentication => "awaiting_authentication",
            ConnectionState::Ready => "ready",
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Failed => "failed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::ConnectionState::*;
    use super::*;

    #[test]
    fn test_documented_transitions_are_allowed() {
        assert!(Initializing.can_transition_to(AwaitingAuthentication));
        assert!(AwaitingAuthentication.can_transition_to(Ready));
        assert!(Initializing.can_transition_to(Ready));
        assert!(Ready.can_transition_to(Disconnected));
        assert!(Disconnected.can_transition_to(Initializing));
        for state in [Initializing, AwaitingAuthentication, Ready, Disconnected] {
            assert!(state.can_transition_to(Failed));
        }
    }

    #[test]
    fn test_failed_is_terminal() {
        for next in [Initializing, AwaitingAuthentication, Ready, Disconnected, Failed] {
            assert!(!Failed.can_transition_to(next));
        }
        assert!(Failed.is_terminal());
    }

    #[test]
    fn test_ready_cannot_skip_back_to_authentication() {
        assert!(!Ready.can_transition_to(AwaitingAuthentication));
        assert!(!Ready.can_transition_to(Initializing));
        assert!(!Disconnected.can_transition_to(Ready));
    }

    #[test]
    fn test_only_ready_accepts_messages() {
        assert!(Ready.accepts_messages());
        for state in [Initializing, AwaitingAuthentication, Disconnected, Failed] {
            assert!(!state.accepts_messages());
        }
    }

    #[test]
    fn test_serializes_snake_case() {
        let json = serde_json::to_string(&AwaitingAuthentication).unwrap();
        assert_eq!(json, "\"awaiting_authentication\"");
        assert_eq!(AwaitingAuthentication.to_string(), "awaiting_authentication");
    }
}
