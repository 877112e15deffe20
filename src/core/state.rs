//! Stations and facilities as one tagged conditional-state type.
//!
//! A station is a top-level screen; at most one is active at a time. A
//! facility is a sub-state owned by exactly one station and only active
//! while its host is.

use super::elements::Elements;
use super::phase::{Phase, PhaseChange, PhaseHistory};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle to a conditional state owned by a session.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct StateId(pub(crate) usize);

impl StateId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind-specific data of a conditional state.
#[derive(Clone, Debug, PartialEq)]
pub enum StateKind {
    Station {
        /// Process-unique number assigned on creation.
        number: u64,
        /// Facilities registered with this station, in registration order.
        facilities: Vec<StateId>,
    },
    Facility {
        host: StateId,
    },
}

/// A station or facility with its phase and declared elements.
#[derive(Clone, Debug)]
pub struct ConditionalState {
    id: StateId,
    name: String,
    kind: StateKind,
    phase: Phase,
    history: PhaseHistory,
    elements: Elements,
}

/// Error returned when a phase change skips or reverses the lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PhaseOrderError {
    pub from: Phase,
    pub to: Phase,
}

impl ConditionalState {
    pub(crate) fn new(id: StateId, name: String, kind: StateKind, elements: Elements) -> Self {
        Self {
            id,
            name,
            kind,
            phase: Phase::New,
            history: PhaseHistory::new(),
            elements,
        }
    }

    pub fn id(&self) -> StateId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &StateKind {
        &self.kind
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn history(&self) -> &PhaseHistory {
        &self.history
    }

    pub fn elements(&self) -> &Elements {
        &self.elements
    }

    pub fn is_station(&self) -> bool {
        matches!(self.kind, StateKind::Station { .. })
    }

    pub fn is_facility(&self) -> bool {
        matches!(self.kind, StateKind::Facility { .. })
    }

    /// Host station of a facility.
    pub fn host(&self) -> Option<StateId> {
        match self.kind {
            StateKind::Facility { host } => Some(host),
            StateKind::Station { .. } => None,
        }
    }

    /// Facilities registered with a station; empty for facilities.
    pub fn facilities(&self) -> &[StateId] {
        match &self.kind {
            StateKind::Station { facilities, .. } => facilities,
            StateKind::Facility { .. } => &[],
        }
    }

    pub(crate) fn register_facility(&mut self, facility: StateId) {
        if let StateKind::Station { facilities, .. } = &mut self.kind {
            if !facilities.contains(&facility) {
                facilities.push(facility);
            }
        }
    }

    /// Move to the next phase. Only transitions call this.
    pub(crate) fn advance_phase(
        &mut self,
        to: Phase,
        transition: u64,
    ) -> Result<(), PhaseOrderError> {
        if !self.phase.can_advance_to(to) {
            return Err(PhaseOrderError {
                from: self.phase,
                to,
            });
        }
        self.history = self.history.record(PhaseChange {
            from: self.phase,
            to,
            timestamp: Utc::now(),
            transition,
        });
        self.phase = to;
        Ok(())
    }
}

impl fmt::Display for ConditionalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StateKind::Station { number, .. } => write!(f, "<S{}: {}>", number, self.name),
            StateKind::Facility { host } => {
                write!(f, "<F{}@{}: {}>", self.id.0, host, self.name)
            }
        }
    }
}
