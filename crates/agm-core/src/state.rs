//! Promotion driver state machine

use crate::error::PromotionError;
use serde::{Deserialize, Serialize};

/// Where the promotion driver is within a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverState {
    /// Deriving facts and collecting duplicate roots
    Scanning,
    /// Applying promotions for the current round
    Promoting,
    /// Idle: converged, capped, or not yet started
    Done,
}

/// States reachable from `from`
#[must_use]
pub fn allowed_transitions(from: DriverState) -> &'static [DriverState] {
    use DriverState::{Done, Promoting, Scanning};
    match from {
        Scanning => &[Promoting, Done],
        Promoting => &[Scanning, Done],
        Done => &[Scanning],
    }
}

/// Validates a driver state transition
///
/// # Errors
/// Returns [`PromotionError::IllegalTransition`] for an edge the machine
/// does not have.
pub fn validate_transition(from: DriverState, to: DriverState) -> Result<(), PromotionError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(PromotionError::IllegalTransition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_cycle_is_legal() {
        use DriverState::*;
        for (from, to) in [(Done, Scanning), (Scanning, Promoting), (Promoting, Scanning), (Promoting, Done), (Scanning, Done)] {
            assert!(validate_transition(from, to).is_ok(), "{from:?} -> {to:?}");
        }
    }

    #[test]
    fn cannot_promote_without_scanning() {
        assert_eq!(
            validate_transition(DriverState::Done, DriverState::Promoting),
            Err(PromotionError::IllegalTransition {
                from: DriverState::Done,
                to: DriverState::Promoting
            })
        );
        assert!(validate_transition(DriverState::Scanning, DriverState::Scanning).is_err());
    }
}
