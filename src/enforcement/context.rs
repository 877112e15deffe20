//! Context provided to pre-flight checks.

use crate::core::{ConditionalState, StateId};
use crate::engine::Transition;

/// Everything a pre-flight check may look at.
#[derive(Clone, Copy, Debug)]
pub struct PreflightContext<'a> {
    pub transition: &'a Transition,
    pub states: &'a [ConditionalState],
    pub active_station: Option<StateId>,
    /// Tries after applying session defaults.
    pub tries: u32,
}

impl<'a> PreflightContext<'a> {
    pub fn state(&self, id: StateId) -> Option<&'a ConditionalState> {
        self.states.get(id.index())
    }

    /// Display name of `id`, falling back to the bare id.
    pub fn describe(&self, id: Option<StateId>) -> String {
        match id {
            Some(id) => self
                .state(id)
                .map(ToString::to_string)
                .unwrap_or_else(|| id.to_string()),
            None => "none".to_string(),
        }
    }
}
