//! Declared elements of a conditional state.
//!
//! An element is an identified observable fact expected to hold while its
//! state is active. From the declaration the engine derives what to wait for
//! when the state is entered (the presence condition) and, for plain
//! elements, what to wait for when it is left (the absence condition).

use super::condition::{GatedCondition, NegatedCondition, SharedCondition};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// How an element behaves when its state is left.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ElementKind {
    /// Absence is awaited on exit unless the next state declares the same id.
    Plain,
    /// Absence is never awaited; the fact may outlive the state.
    Logical,
}

/// One declared element.
///
/// # Example
///
/// ```rust
/// use std::collections::HashSet;
/// use transit::core::{Element, FnCondition};
///
/// let element = Element::new(FnCondition::predicate("home-button", || true).shared());
/// assert_eq!(element.id(), "home-button");
///
/// let persisting: HashSet<String> = ["home-button".to_string()].into();
/// assert!(element.exit_condition(&persisting).is_none());
/// assert!(element.exit_condition(&HashSet::new()).is_some());
/// ```
#[derive(Clone, Debug)]
pub struct Element {
    id: String,
    kind: ElementKind,
    condition: SharedCondition,
    gate: Option<SharedCondition>,
    absence: Option<SharedCondition>,
}

impl Element {
    /// Declare a plain element identified by its condition's description.
    pub fn new(condition: SharedCondition) -> Self {
        Self {
            id: condition.description(),
            kind: ElementKind::Plain,
            condition,
            gate: None,
            absence: None,
        }
    }

    /// Declare a logical element identified by its condition's description.
    pub fn logical(condition: SharedCondition) -> Self {
        Self {
            kind: ElementKind::Logical,
            ..Self::new(condition)
        }
    }

    /// Override the element id used for de-duplication.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Only expect the element while `gate` holds.
    pub fn with_gate(mut self, gate: SharedCondition) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Use `absence` instead of the negated presence condition on exit.
    pub fn with_absence_condition(mut self, absence: SharedCondition) -> Self {
        self.absence = Some(absence);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn gate(&self) -> Option<&SharedCondition> {
        self.gate.as_ref()
    }

    pub fn is_logical(&self) -> bool {
        self.kind == ElementKind::Logical
    }

    /// Condition to await when the owning state is entered.
    pub fn enter_condition(&self) -> SharedCondition {
        self.gated(Arc::clone(&self.condition))
    }

    /// Condition to await when the owning state is left.
    ///
    /// `None` for logical elements and for elements whose id is in
    /// `persisting_ids`, i.e. also declared by a state that stays or becomes
    /// active.
    pub fn exit_condition(&self, persisting_ids: &HashSet<String>) -> Option<SharedCondition> {
        if self.is_logical() || persisting_ids.contains(&self.id) {
            return None;
        }
        let absence = match &self.absence {
            Some(absence) => Arc::clone(absence),
            None => Arc::new(NegatedCondition::new(Arc::clone(&self.condition))),
        };
        Some(self.gated(absence))
    }

    fn gated(&self, condition: SharedCondition) -> SharedCondition {
        match &self.gate {
            Some(gate) => Arc::new(GatedCondition::new(condition, Arc::clone(gate))),
            None => condition,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::condition::FnCondition;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn flag_condition(description: &str, flag: &Arc<AtomicBool>) -> SharedCondition {
        let flag = Arc::clone(flag);
        FnCondition::predicate(description, move || flag.load(Ordering::SeqCst)).shared()
    }

    fn ids(values: &[&str]) -> HashSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn id_defaults_to_description() {
        let flag = Arc::new(AtomicBool::new(true));
        let element = Element::new(flag_condition("settings-title", &flag));
        assert_eq!(element.id(), "settings-title");
        assert_eq!(element.kind(), ElementKind::Plain);
    }

    #[test]
    fn with_id_overrides_default() {
        let flag = Arc::new(AtomicBool::new(true));
        let element = Element::new(flag_condition("View: title", &flag)).with_id("title");
        assert_eq!(element.id(), "title");
    }

    #[test]
    fn exit_condition_is_negated_presence() {
        let flag = Arc::new(AtomicBool::new(true));
        let element = Element::new(flag_condition("home-button", &flag));

        let exit = element.exit_condition(&HashSet::new()).unwrap();
        assert!(!exit.check().is_fulfilled());

        flag.store(false, Ordering::SeqCst);
        assert!(exit.check().is_fulfilled());
    }

    #[test]
    fn persisting_element_has_no_exit_condition() {
        let flag = Arc::new(AtomicBool::new(true));
        let element = Element::new(flag_condition("toolbar", &flag));

        assert!(element.exit_condition(&ids(&["toolbar"])).is_none());
        assert!(element.exit_condition(&ids(&["other"])).is_some());
    }

    #[test]
    fn logical_element_never_has_exit_condition() {
        let flag = Arc::new(AtomicBool::new(true));
        let element = Element::logical(flag_condition("signed-in", &flag));

        assert!(element.is_logical());
        assert!(element.exit_condition(&HashSet::new()).is_none());
    }

    #[test]
    fn explicit_absence_condition_is_used() {
        let shown = Arc::new(AtomicBool::new(true));
        let gone = Arc::new(AtomicBool::new(false));
        let element = Element::new(flag_condition("dialog", &shown))
            .with_absence_condition(flag_condition("dialog dismissed", &gone));

        let exit = element.exit_condition(&HashSet::new()).unwrap();
        assert_eq!(exit.description(), "dialog dismissed");
        assert!(!exit.check().is_fulfilled());

        gone.store(true, Ordering::SeqCst);
        assert!(exit.check().is_fulfilled());
    }

    #[test]
    fn gate_applies_to_enter_and_exit() {
        let gate = Arc::new(AtomicBool::new(false));
        let shown = Arc::new(AtomicBool::new(true));
        let element = Element::new(flag_condition("promo", &shown))
            .with_gate(flag_condition("promo enabled", &gate));

        shown.store(false, Ordering::SeqCst);
        assert!(element.enter_condition().check().is_fulfilled());

        gate.store(true, Ordering::SeqCst);
        assert!(!element.enter_condition().check().is_fulfilled());
        assert!(element.exit_condition(&HashSet::new()).unwrap().check().is_fulfilled());
    }
}
