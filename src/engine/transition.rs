//! Transition descriptions and their outcomes.

use crate::core::{SharedCondition, StateId};
use crate::engine::options::TransitionOptions;
use crate::engine::waiter::ConditionStatusTable;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// What a transition moves.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum TransitionKind {
    /// Station to station, or into the first station when there is no origin.
    Trip,
    /// Enter a facility of the active station.
    FacilityCheckIn,
    /// Leave a facility of the active station.
    FacilityCheckOut,
    /// Leave one facility and enter another of the same station.
    FacilitySwap,
}

impl TransitionKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Trip => "Trip",
            Self::FacilityCheckIn => "FacilityCheckIn",
            Self::FacilityCheckOut => "FacilityCheckOut",
            Self::FacilitySwap => "FacilitySwap",
        }
    }

    pub fn is_facility_transition(&self) -> bool {
        !matches!(self, Self::Trip)
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A state change to execute, built with [`crate::builder::TransitionBuilder`].
///
/// For facility transitions `origin` and `destination` are facilities and
/// `host` is the station they belong to.
#[derive(Clone, Debug)]
pub struct Transition {
    pub(crate) kind: TransitionKind,
    pub(crate) host: Option<StateId>,
    pub(crate) origin: Option<StateId>,
    pub(crate) destination: Option<StateId>,
    pub(crate) options: TransitionOptions,
    pub(crate) conditions: Vec<SharedCondition>,
}

impl Transition {
    pub fn kind(&self) -> TransitionKind {
        self.kind
    }

    pub fn host(&self) -> Option<StateId> {
        self.host
    }

    pub fn origin(&self) -> Option<StateId> {
        self.origin
    }

    pub fn destination(&self) -> Option<StateId> {
        self.destination
    }

    pub fn options(&self) -> &TransitionOptions {
        &self.options
    }

    /// Conditions awaited with the TRANSITION tag.
    pub fn conditions(&self) -> &[SharedCondition] {
        &self.conditions
    }
}

/// Outcome of a successful transition.
#[derive(Clone, Debug)]
pub struct Arrival {
    pub transition: u64,
    pub kind: TransitionKind,
    /// Tries used, the last one being the successful one.
    pub attempts: u32,
    /// Wait time of the successful try.
    pub elapsed: Duration,
    pub report: ConditionStatusTable,
}

/// Diagnostic payload of a failed transition.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransitionFailure {
    /// Human-readable transition, e.g. `Trip #3 <S1: Home> -> <S2: Settings>`.
    pub transition: String,
    pub attempts: u32,
    pub elapsed: Duration,
    pub reason: String,
    pub report: ConditionStatusTable,
}

impl fmt::Display for TransitionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} {} (try {}, {}ms):",
            self.transition,
            self.reason,
            self.attempts,
            self.elapsed.as_millis()
        )?;
        write!(f, "{}", self.report)
    }
}
