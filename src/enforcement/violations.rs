//! Structural misuse detected before a transition runs.

use crate::core::{Phase, StateId};
use thiserror::Error;

/// One reason a transition cannot be executed as requested.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ViolationError {
    #[error("Unknown state {id}")]
    UnknownState { id: StateId },

    #[error("{state} is not a station")]
    NotAStation { state: String },

    #[error("{state} is not a facility")]
    NotAFacility { state: String },

    #[error("{state} is {actual}, expected {expected}")]
    WrongPhase {
        state: String,
        expected: Phase,
        actual: Phase,
    },

    #[error("{facility} belongs to {actual_host}, not {claimed_host}")]
    ForeignFacility {
        facility: String,
        claimed_host: String,
        actual_host: String,
    },

    #[error("Origin {origin} is not the active station (active: {active})")]
    NotActiveStation { origin: String, active: String },

    #[error("{active} is already active; an entry point requires no active station")]
    StationAlreadyActive { active: String },

    #[error("Origin and destination are both {state}")]
    SameOriginAndDestination { state: String },

    #[error("Tries must be at least 1")]
    InvalidTries,

    #[error("{state} cannot move from {from} to {to}")]
    PhaseOrder { state: String, from: Phase, to: Phase },
}
