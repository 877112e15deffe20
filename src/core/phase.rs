//! Lifecycle phases of a conditional state and their history.
//!
//! Every station and facility moves through the same strictly ordered
//! sequence of phases. A phase can only ever advance to its immediate
//! successor, so the observed sequence is always a prefix of
//! `New -> TransitioningTo -> Active -> TransitioningFrom -> Finished`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Lifecycle phase of a station or facility.
///
/// # Example
///
/// ```rust
/// use transit::core::Phase;
///
/// assert_eq!(Phase::New.next(), Some(Phase::TransitioningTo));
/// assert!(Phase::New.can_advance_to(Phase::TransitioningTo));
/// assert!(!Phase::Active.can_advance_to(Phase::New));
/// assert!(Phase::Finished.is_final());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Phase {
    /// Created, no conditions evaluated yet.
    New,
    /// Entry conditions are being awaited.
    TransitioningTo,
    /// Entry conditions held when the state was entered.
    Active,
    /// Exit conditions are being awaited.
    TransitioningFrom,
    /// Terminal; the state is inert.
    Finished,
}

impl Phase {
    /// All phases in lifecycle order.
    pub const ORDER: [Phase; 5] = [
        Phase::New,
        Phase::TransitioningTo,
        Phase::Active,
        Phase::TransitioningFrom,
        Phase::Finished,
    ];

    /// Get the phase's name for display/logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::TransitioningTo => "TRANSITIONING_TO",
            Self::Active => "ACTIVE",
            Self::TransitioningFrom => "TRANSITIONING_FROM",
            Self::Finished => "FINISHED",
        }
    }

    /// The only phase this one may advance to, if any.
    pub fn next(&self) -> Option<Phase> {
        match self {
            Self::New => Some(Self::TransitioningTo),
            Self::TransitioningTo => Some(Self::Active),
            Self::Active => Some(Self::TransitioningFrom),
            Self::TransitioningFrom => Some(Self::Finished),
            Self::Finished => None,
        }
    }

    /// Check whether moving to `to` respects the lifecycle order.
    pub fn can_advance_to(&self, to: Phase) -> bool {
        self.next() == Some(to)
    }

    /// Check if this is the terminal phase.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Finished)
    }

    /// Check if a transition into or out of the state is in flight.
    pub fn is_transitioning(&self) -> bool {
        matches!(self, Self::TransitioningTo | Self::TransitioningFrom)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Record of a single phase change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhaseChange {
    /// The phase being left
    pub from: Phase,
    /// The phase being entered
    pub to: Phase,
    /// When the change happened
    pub timestamp: DateTime<Utc>,
    /// The transition that caused the change
    pub transition: u64,
}

/// Ordered history of phase changes of one conditional state.
///
/// History is immutable - `record` returns a new history with the change
/// appended.
///
/// # Example
///
/// ```rust
/// use transit::core::{Phase, PhaseChange, PhaseHistory};
/// use chrono::Utc;
///
/// let history = PhaseHistory::new().record(PhaseChange {
///     from: Phase::New,
///     to: Phase::TransitioningTo,
///     timestamp: Utc::now(),
///     transition: 1,
/// });
///
/// assert_eq!(history.get_path(), vec![Phase::New, Phase::TransitioningTo]);
/// assert!(history.is_monotonic());
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PhaseHistory {
    changes: Vec<PhaseChange>,
}

impl PhaseHistory {
    /// Create a new empty history.
    pub fn new() -> Self {
        Self {
            changes: Vec::new(),
        }
    }

    /// Record a change, returning a new history.
    pub fn record(&self, change: PhaseChange) -> Self {
        let mut changes = self.changes.clone();
        changes.push(change);
        Self { changes }
    }

    /// Phases traversed, starting with `New`.
    pub fn get_path(&self) -> Vec<Phase> {
        let mut path = vec![Phase::New];
        path.extend(self.changes.iter().map(|c| c.to));
        path
    }

    /// Check the path is a prefix of [`Phase::ORDER`].
    pub fn is_monotonic(&self) -> bool {
        let path = self.get_path();
        path.len() <= Phase::ORDER.len()
            && path.iter().zip(Phase::ORDER.iter()).all(|(a, b)| a == b)
    }

    /// Time between the first and the last recorded change.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.changes.first(), self.changes.last()) {
            last.timestamp
                .signed_duration_since(first.timestamp)
                .to_std()
                .ok()
        } else {
            None
        }
    }

    /// Get all recorded changes.
    pub fn changes(&self) -> &[PhaseChange] {
        &self.changes
    }
}
