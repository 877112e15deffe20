//! Computing what a transition waits for.
//!
//! Given what is being entered, what is being left, and which element ids
//! remain declared afterwards, build the ENTER, EXIT and TRANSITION waits.
//! An element left behind whose id is still declared by a state that is (or
//! becomes) active is persisting, so its absence is not awaited.

use crate::core::{Elements, SharedCondition};
use crate::engine::waiter::{ConditionWait, OriginTag};
use std::collections::HashSet;
use std::sync::Arc;

/// Build the wait-set of a transition.
///
/// Order is ENTER, then EXIT, then TRANSITION; it only matters for the
/// readability of diagnostics.
///
/// # Example
///
/// ```rust
/// use transit::builder::ElementsBuilder;
/// use transit::core::{Elements, FnCondition};
/// use transit::engine::{compute_wait_set, OriginTag};
///
/// let mut a = ElementsBuilder::new("A");
/// a.declare_element(FnCondition::predicate("toolbar", || true).shared())
///     .declare_element(FnCondition::predicate("home-button", || true).shared());
/// let mut b = ElementsBuilder::new("B");
/// b.declare_element(FnCondition::predicate("toolbar", || true).shared());
/// let (a, b) = (a.build().unwrap(), b.build().unwrap());
///
/// let waits = compute_wait_set(&b, &a, &b.element_ids(), &[]);
/// let exits: Vec<_> = waits
///     .iter()
///     .filter(|w| w.origin() == OriginTag::Exit)
///     .filter_map(|w| w.element_id())
///     .collect();
/// assert_eq!(exits, vec!["home-button"]);
/// ```
pub fn compute_wait_set(
    entering: &Elements,
    leaving: &Elements,
    persisting_ids: &HashSet<String>,
    transition_conditions: &[SharedCondition],
) -> Vec<ConditionWait> {
    let mut waits = Vec::new();

    for element in entering.elements() {
        waits.push(ConditionWait::for_element(
            element.enter_condition(),
            OriginTag::Enter,
            element.id(),
        ));
    }
    for condition in entering.enter_conditions() {
        waits.push(ConditionWait::new(Arc::clone(condition), OriginTag::Enter));
    }

    for element in leaving.elements() {
        if let Some(exit) = element.exit_condition(persisting_ids) {
            waits.push(ConditionWait::for_element(exit, OriginTag::Exit, element.id()));
        }
    }
    for condition in leaving.exit_conditions() {
        waits.push(ConditionWait::new(Arc::clone(condition), OriginTag::Exit));
    }

    for condition in transition_conditions {
        waits.push(ConditionWait::new(
            Arc::clone(condition),
            OriginTag::Transition,
        ));
    }

    waits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ElementsBuilder;
    use crate::core::FnCondition;

    fn condition(description: &str) -> SharedCondition {
        FnCondition::predicate(description, || true).shared()
    }

    fn declared(plain: &[&str], logical: &[&str]) -> Elements {
        let mut builder = ElementsBuilder::new("test");
        for id in plain {
            builder.declare_element(condition(id));
        }
        for id in logical {
            builder.declare_logical_element(condition(id));
        }
        builder.build().unwrap()
    }

    fn ids_with(waits: &[ConditionWait], origin: OriginTag) -> Vec<&str> {
        waits
            .iter()
            .filter(|w| w.origin() == origin)
            .filter_map(|w| w.element_id())
            .collect()
    }

    #[test]
    fn entry_point_has_only_enter_waits() {
        let destination = declared(&["home-button"], &[]);

        let waits = compute_wait_set(
            &destination,
            &Elements::empty(),
            &destination.element_ids(),
            &[],
        );

        assert_eq!(ids_with(&waits, OriginTag::Enter), vec!["home-button"]);
        assert!(ids_with(&waits, OriginTag::Exit).is_empty());
    }

    #[test]
    fn distinct_elements_produce_enter_and_exit() {
        let origin = declared(&["home-button"], &[]);
        let destination = declared(&["settings-title"], &[]);

        let waits = compute_wait_set(&destination, &origin, &destination.element_ids(), &[]);

        assert_eq!(ids_with(&waits, OriginTag::Enter), vec!["settings-title"]);
        assert_eq!(ids_with(&waits, OriginTag::Exit), vec!["home-button"]);
    }

    #[test]
    fn shared_plain_element_is_not_awaited_to_disappear() {
        let origin = declared(&["toolbar", "home-button"], &[]);
        let destination = declared(&["toolbar", "settings-title"], &[]);

        let waits = compute_wait_set(&destination, &origin, &destination.element_ids(), &[]);

        assert_eq!(
            ids_with(&waits, OriginTag::Enter),
            vec!["toolbar", "settings-title"]
        );
        assert_eq!(ids_with(&waits, OriginTag::Exit), vec!["home-button"]);
    }

    #[test]
    fn shared_logical_element_has_no_exit_wait() {
        let origin = declared(&[], &["toolbar-visible"]);
        let destination = declared(&[], &["toolbar-visible"]);

        let waits = compute_wait_set(&destination, &origin, &destination.element_ids(), &[]);

        assert!(ids_with(&waits, OriginTag::Exit).is_empty());
        assert_eq!(ids_with(&waits, OriginTag::Enter), vec!["toolbar-visible"]);
    }

    #[test]
    fn logical_element_absence_is_never_awaited() {
        let origin = declared(&[], &["signed-in"]);
        let destination = declared(&["settings-title"], &[]);

        let waits = compute_wait_set(&destination, &origin, &destination.element_ids(), &[]);

        assert!(ids_with(&waits, OriginTag::Exit).is_empty());
    }

    #[test]
    fn extra_conditions_keep_their_tags_and_order() {
        let mut origin = ElementsBuilder::new("A");
        origin.declare_exit_condition(condition("draft saved"));
        let mut destination = ElementsBuilder::new("B");
        destination.declare_enter_condition(condition("network idle"));
        let (origin, destination) = (origin.build().unwrap(), destination.build().unwrap());

        let waits = compute_wait_set(
            &destination,
            &origin,
            &destination.element_ids(),
            &[condition("animation done")],
        );

        let tagged: Vec<(OriginTag, &str)> =
            waits.iter().map(|w| (w.origin(), w.description())).collect();
        assert_eq!(
            tagged,
            vec![
                (OriginTag::Enter, "network idle"),
                (OriginTag::Exit, "draft saved"),
                (OriginTag::Transition, "animation done"),
            ]
        );
    }

    #[test]
    fn persisting_ids_may_come_from_a_third_state() {
        let leaving = declared(&["dialog-ok", "toolbar"], &[]);
        let host_ids: HashSet<String> = ["toolbar".to_string()].into();

        let waits = compute_wait_set(&Elements::empty(), &leaving, &host_ids, &[]);

        assert_eq!(ids_with(&waits, OriginTag::Exit), vec!["dialog-ok"]);
    }
}
