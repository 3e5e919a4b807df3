//! Lifecycle state machine for judging sessions and robot game matches.
//!
//! The transition table is `not-started -> in-progress -> {completed,
//! aborted}`. Terminal states admit no further transitions; the only way
//! back to `not-started` is the explicit administrative reset, which is
//! modeled as its own operation rather than a transition.
//!
//! Validation here is pure. Callers check preconditions (including the
//! session rubric-indicator gate) and then perform a single key-qualified
//! upsert; there is no cross-entity transaction, so a crash between the
//! precondition check and the status write can leave the store in a
//! last-known-good state the caller must re-fetch to discover.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{RubricStatus, Status};

/// Why a requested lifecycle transition was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("cannot transition from terminal status {from}")]
    Terminal { from: Status },

    #[error("invalid transition from {from} to {to}")]
    Invalid { from: Status, to: Status },

    #[error("session rubric indicators must all be completed before the session can complete")]
    RubricsIncomplete,
}

/// Validate a lifecycle transition against the state machine.
pub fn validate_transition(from: Status, to: Status) -> Result<(), TransitionError> {
    if from.is_terminal() {
        return Err(TransitionError::Terminal { from });
    }

    match (from, to) {
        (Status::NotStarted, Status::InProgress) => Ok(()),
        (Status::InProgress, Status::Completed) => Ok(()),
        (Status::InProgress, Status::Aborted) => Ok(()),
        (from, to) => Err(TransitionError::Invalid { from, to }),
    }
}

/// The three per-category rubric completion indicators carried on a
/// judging session.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionIndicators {
    pub core_values: RubricStatus,
    pub innovation_project: RubricStatus,
    pub robot_design: RubricStatus,
}

impl SessionIndicators {
    pub fn all_completed(&self) -> bool {
        self.core_values.is_completed()
            && self.innovation_project.is_completed()
            && self.robot_design.is_completed()
    }
}

/// Validate completing a judging session: the ordinary transition rules
/// apply, plus all three rubric indicators must have reached `completed`.
pub fn validate_session_completion(
    from: Status,
    indicators: SessionIndicators,
) -> Result<(), TransitionError> {
    validate_transition(from, Status::Completed)?;
    if !indicators.all_completed() {
        return Err(TransitionError::RubricsIncomplete);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed_indicators() -> SessionIndicators {
        SessionIndicators {
            core_values: RubricStatus::Completed,
            innovation_project: RubricStatus::Ready,
            robot_design: RubricStatus::WaitingForReview,
        }
    }

    #[test]
    fn start_requires_not_started() {
        assert!(validate_transition(Status::NotStarted, Status::InProgress).is_ok());
        assert_eq!(
            validate_transition(Status::InProgress, Status::InProgress),
            Err(TransitionError::Invalid {
                from: Status::InProgress,
                to: Status::InProgress
            })
        );
    }

    #[test]
    fn terminal_states_absorb() {
        for from in [Status::Completed, Status::Aborted] {
            for to in [
                Status::NotStarted,
                Status::InProgress,
                Status::Completed,
                Status::Aborted,
            ] {
                assert_eq!(
                    validate_transition(from, to),
                    Err(TransitionError::Terminal { from })
                );
            }
        }
    }

    #[test]
    fn abort_always_allowed_from_in_progress() {
        assert!(validate_transition(Status::InProgress, Status::Aborted).is_ok());
        // but never from scheduled
        assert!(validate_transition(Status::NotStarted, Status::Aborted).is_err());
    }

    #[test]
    fn completion_skipping_in_progress_rejected() {
        assert_eq!(
            validate_transition(Status::NotStarted, Status::Completed),
            Err(TransitionError::Invalid {
                from: Status::NotStarted,
                to: Status::Completed
            })
        );
    }

    #[test]
    fn session_completes_iff_all_indicators_completed() {
        assert!(validate_session_completion(Status::InProgress, completed_indicators()).is_ok());

        let mut indicators = completed_indicators();
        indicators.robot_design = RubricStatus::InProgress;
        assert_eq!(
            validate_session_completion(Status::InProgress, indicators),
            Err(TransitionError::RubricsIncomplete)
        );

        let mut indicators = completed_indicators();
        indicators.core_values = RubricStatus::Empty;
        assert_eq!(
            validate_session_completion(Status::InProgress, indicators),
            Err(TransitionError::RubricsIncomplete)
        );
    }

    #[test]
    fn session_completion_checks_status_before_indicators() {
        assert_eq!(
            validate_session_completion(Status::Completed, completed_indicators()),
            Err(TransitionError::Terminal {
                from: Status::Completed
            })
        );
    }
}
