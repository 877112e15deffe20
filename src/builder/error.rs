//! Build errors for element declarations and transitions.

use crate::engine::TransitionKind;
use thiserror::Error;

/// Errors that can occur when building elements and transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("Transition origin not specified. Call .from(state)")]
    MissingOrigin,

    #[error("Transition destination not specified. Call .to(state)")]
    MissingDestination,

    #[error("Facility transition host not specified. Call .at(station)")]
    MissingHost,

    #[error("{kind} has no origin. Remove the .from(state) call")]
    UnexpectedOrigin { kind: TransitionKind },

    #[error("{kind} has no destination. Remove the .to(state) call")]
    UnexpectedDestination { kind: TransitionKind },

    #[error("{kind} has no host. Remove the .at(station) call")]
    UnexpectedHost { kind: TransitionKind },

    #[error("Element '{id}' declared twice in '{state}'")]
    DuplicateElement { state: String, id: String },
}
