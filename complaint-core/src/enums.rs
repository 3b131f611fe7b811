//! Enum types for complaint records

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// SEVERITY
// ============================================================================

/// How badly the complaint affected the filing agent's task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// All variants, lowest first.
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    /// Convert to the on-disk string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    /// Parse from a string, case-insensitively.
    pub fn from_str_ci(s: &str) -> Result<Self, SeverityParseError> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            _ => Err(SeverityParseError(s.to_string())),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Severity {
    type Err = SeverityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_ci(s)
    }
}

/// Error when parsing an invalid severity string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeverityParseError(pub String);

impl fmt::Display for SeverityParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid severity: {}", self.0)
    }
}

impl std::error::Error for SeverityParseError {}

// ============================================================================
// RESOLUTION STATE
// ============================================================================

/// Resolution state of a complaint.
///
/// # State Transition Diagram
///
/// ```text
///            ┌──────────────► Resolved (terminal)
///            │                    ▲
///   Open ────┼──────────────► Rejected (terminal)
///    ▲ │     │                    ▲
///    │ └─────┴──► Deferred ───────┘
///    └────────────────┘
/// ```
///
/// Open may move to any other state; Deferred may move to Open, Resolved or
/// Rejected; Resolved and Rejected never move again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionState {
    #[default]
    Open,
    Resolved,
    Rejected,
    Deferred,
}

impl ResolutionState {
    /// Convert to the on-disk string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionState::Open => "open",
            ResolutionState::Resolved => "resolved",
            ResolutionState::Rejected => "rejected",
            ResolutionState::Deferred => "deferred",
        }
    }

    /// Parse from a string, case-insensitively.
    pub fn from_str_ci(s: &str) -> Result<Self, ResolutionStateParseError> {
        match s.trim().to_lowercase().as_str() {
            "open" => Ok(ResolutionState::Open),
            "resolved" => Ok(ResolutionState::Resolved),
            "rejected" => Ok(ResolutionState::Rejected),
            "deferred" => Ok(ResolutionState::Deferred),
            _ => Err(ResolutionStateParseError(s.to_string())),
        }
    }

    /// Whether the state admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ResolutionState::Resolved | ResolutionState::Rejected)
    }

    /// Whether the complaint still awaits a decision (Open or Deferred).
    pub fn is_unresolved(&self) -> bool {
        !self.is_terminal()
    }

    /// Check whether moving from `self` to `next` is a legal transition.
    ///
    /// Staying in the same state is not a transition and returns `false`;
    /// callers treat it as an idempotent no-op.
    pub fn can_transition_to(&self, next: ResolutionState) -> bool {
        use ResolutionState::*;
        matches!(
            (self, next),
            (Open, Resolved | Rejected | Deferred) | (Deferred, Open | Resolved | Rejected)
        )
    }
}

impl fmt::Display for ResolutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResolutionState {
    type Err = ResolutionStateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_ci(s)
    }
}

/// Error when parsing an invalid resolution state string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionStateParseError(pub String);

impl fmt::Display for ResolutionStateParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid resolution state: {}", self.0)
    }
}

impl std::error::Error for ResolutionStateParseError {}

#[cfg(test)]
mod tests {
    use super::*;
    use ResolutionState::*;

    const STATES: [ResolutionState; 4] = [Open, Resolved, Rejected, Deferred];

    #[test]
    fn test_severity_string_roundtrip() {
        for severity in Severity::ALL {
            assert_eq!(severity.as_str().parse::<Severity>(), Ok(severity));
        }
        assert_eq!("CRITICAL".parse::<Severity>(), Ok(Severity::Critical));
        assert!("urgent".parse::<Severity>().is_err());
    }

    #[test]
    fn test_severity_serde_is_lowercase() {
        assert_eq!(
            serde_json::to_string(&Severity::High).unwrap(),
            "\"high\""
        );
        let parsed: Severity = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(parsed, Severity::Medium);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn test_resolution_state_serde_is_lowercase() {
        assert_eq!(
            serde_json::to_string(&Deferred).unwrap(),
            "\"deferred\""
        );
    }

    #[test]
    fn test_open_moves_anywhere() {
        assert!(Open.can_transition_to(Resolved));
        assert!(Open.can_transition_to(Rejected));
        assert!(Open.can_transition_to(Deferred));
    }

    #[test]
    fn test_terminal_states_never_move() {
        for from in [Resolved, Rejected] {
            assert!(from.is_terminal());
            for to in STATES {
                assert!(!from.can_transition_to(to), "{from} -> {to} must be illegal");
            }
        }
    }

    #[test]
    fn test_deferred_transitions() {
        assert!(Deferred.can_transition_to(Open));
        assert!(Deferred.can_transition_to(Resolved));
        assert!(Deferred.can_transition_to(Rejected));
        assert!(!Deferred.can_transition_to(Deferred));
    }

    #[test]
    fn test_self_transition_is_not_a_transition() {
        for state in STATES {
            assert!(!state.can_transition_to(state));
        }
    }

    #[test]
    fn test_unresolved() {
        assert!(Open.is_unresolved());
        assert!(Deferred.is_unresolved());
        assert!(!Resolved.is_unresolved());
        assert!(!Rejected.is_unresolved());
    }
}
