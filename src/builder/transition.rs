//! Builder for constructing transitions.

use crate::builder::error::BuildError;
use crate::core::{Condition, SharedCondition, StateId};
use crate::engine::{Transition, TransitionKind, TransitionOptions};
use std::sync::Arc;

/// Builder for constructing transitions with a fluent API.
///
/// # Example
///
/// ```rust
/// use transit::builder::{BuildError, TransitionBuilder};
///
/// let result = TransitionBuilder::check_out().build();
/// assert!(matches!(result, Err(BuildError::MissingHost)));
/// ```
pub struct TransitionBuilder {
    kind: TransitionKind,
    host: Option<StateId>,
    from: Option<StateId>,
    to: Option<StateId>,
    options: TransitionOptions,
    conditions: Vec<SharedCondition>,
}

impl TransitionBuilder {
    /// Create a builder for a transition of `kind`.
    pub fn new(kind: TransitionKind) -> Self {
        Self {
            kind,
            host: None,
            from: None,
            to: None,
            options: TransitionOptions::default(),
            conditions: Vec::new(),
        }
    }

    /// Station to station. Leave out `.from()` for an entry point.
    pub fn trip() -> Self {
        Self::new(TransitionKind::Trip)
    }

    /// Enter the facility set with `.to()` on the station set with `.at()`.
    ///
    /// A check-in has no origin; calling `.from()` fails the build.
    pub fn check_in() -> Self {
        Self::new(TransitionKind::FacilityCheckIn)
    }

    /// Leave the facility set with `.from()` on the station set with `.at()`.
    ///
    /// A check-out has no destination; calling `.to()` fails the build.
    pub fn check_out() -> Self {
        Self::new(TransitionKind::FacilityCheckOut)
    }

    /// Leave `.from()` and enter `.to()`, both facilities of `.at()`.
    pub fn swap() -> Self {
        Self::new(TransitionKind::FacilitySwap)
    }

    /// Set the host station of a facility transition.
    pub fn at(mut self, station: StateId) -> Self {
        self.host = Some(station);
        self
    }

    /// Set the origin state.
    pub fn from(mut self, state: StateId) -> Self {
        self.from = Some(state);
        self
    }

    /// Set the destination state.
    pub fn to(mut self, state: StateId) -> Self {
        self.to = Some(state);
        self
    }

    pub fn options(mut self, options: TransitionOptions) -> Self {
        self.options = options;
        self
    }

    /// Also wait for `condition`, tagged as a transition condition.
    pub fn condition(mut self, condition: SharedCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Same as [`Self::condition`] for a concrete condition type.
    pub fn with<C>(self, condition: C) -> Self
    where
        C: Condition + 'static,
    {
        self.condition(Arc::new(condition))
    }

    /// Build the transition.
    pub fn build(self) -> Result<Transition, BuildError> {
        let needs_origin = matches!(
            self.kind,
            TransitionKind::FacilityCheckOut | TransitionKind::FacilitySwap
        );
        let takes_origin = self.kind != TransitionKind::FacilityCheckIn;
        let needs_destination = !matches!(self.kind, TransitionKind::FacilityCheckOut);
        let kind = self.kind;

        if !kind.is_facility_transition() && self.host.is_some() {
            return Err(BuildError::UnexpectedHost { kind });
        }
        if !takes_origin && self.from.is_some() {
            return Err(BuildError::UnexpectedOrigin { kind });
        }
        if !needs_destination && self.to.is_some() {
            return Err(BuildError::UnexpectedDestination { kind });
        }
        if kind.is_facility_transition() && self.host.is_none() {
            return Err(BuildError::MissingHost);
        }
        if needs_origin && self.from.is_none() {
            return Err(BuildError::MissingOrigin);
        }
        if needs_destination && self.to.is_none() {
            return Err(BuildError::MissingDestination);
        }

        Ok(Transition {
            kind,
            host: self.host,
            origin: self.from,
            destination: self.to,
            options: self.options,
            conditions: self.conditions,
        })
    }
}
