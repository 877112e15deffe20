//! Errors surfaced to the caller of a session operation.

use crate::builder::BuildError;
use crate::config::ConfigError;
use crate::engine::transition::TransitionFailure;
use crate::enforcement::ViolationError;
use thiserror::Error;

/// Errors that can occur while declaring states or running transitions.
#[derive(Debug, Error)]
pub enum TransitError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("Structural misuse: {}", list(.violations))]
    Structural { violations: Vec<ViolationError> },

    #[error("{0}")]
    Timeout(Box<TransitionFailure>),

    #[error("{0}")]
    ConditionError(Box<TransitionFailure>),

    #[error("{0}")]
    AlreadyFulfilled(Box<TransitionFailure>),

    #[error("{0}")]
    ConditionsNotHeld(Box<TransitionFailure>),

    #[error("Single active station invariant violated (active: {})", .active.join(", "))]
    InvariantViolation { active: Vec<String> },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl TransitError {
    pub(crate) fn structural(violation: ViolationError) -> Self {
        Self::Structural {
            violations: vec![violation],
        }
    }

    /// Diagnostic payload, for failures that carry one.
    pub fn failure(&self) -> Option<&TransitionFailure> {
        match self {
            Self::Timeout(failure)
            | Self::ConditionError(failure)
            | Self::AlreadyFulfilled(failure)
            | Self::ConditionsNotHeld(failure) => Some(&**failure),
            _ => None,
        }
    }

    /// Violations of a structural misuse.
    pub fn violations(&self) -> &[ViolationError] {
        match self {
            Self::Structural { violations } => violations,
            _ => &[],
        }
    }

    /// Programming errors that indicate a bug rather than a slow UI.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Build(_) | Self::Structural { .. } | Self::InvariantViolation { .. }
        )
    }
}

fn list(violations: &[ViolationError]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
