//! Builder used by a state to declare its elements.

use crate::builder::error::BuildError;
use crate::core::{Element, Elements, SharedCondition};
use std::collections::HashSet;

/// Collects the declarations of one state and freezes them into
/// [`Elements`].
///
/// A builder is handed to the declaration closure of
/// [`crate::engine::TransitSession::create_station`] and friends; `build`
/// consumes it, so declarations cannot be added after the state exists.
///
/// # Example
///
/// ```rust
/// use transit::builder::ElementsBuilder;
/// use transit::core::FnCondition;
///
/// let mut builder = ElementsBuilder::new("Settings");
/// builder
///     .declare_element(FnCondition::predicate("settings-title", || true).shared())
///     .declare_logical_element(FnCondition::predicate("signed-in", || true).shared())
///     .declare_exit_condition(FnCondition::predicate("settings saved", || true).shared());
///
/// let elements = builder.build().unwrap();
/// assert_eq!(elements.elements().len(), 2);
/// assert_eq!(elements.exit_conditions().len(), 1);
/// ```
pub struct ElementsBuilder {
    owner: String,
    elements: Vec<Element>,
    enter_conditions: Vec<SharedCondition>,
    exit_conditions: Vec<SharedCondition>,
    duplicate: Option<String>,
}

impl ElementsBuilder {
    /// Create a builder for the state named `owner`.
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            elements: Vec::new(),
            enter_conditions: Vec::new(),
            exit_conditions: Vec::new(),
            duplicate: None,
        }
    }

    /// Declare a plain element: awaited on entry, its absence awaited on
    /// exit unless the next state declares the same id.
    pub fn declare_element(&mut self, condition: SharedCondition) -> &mut Self {
        self.declare(Element::new(condition))
    }

    /// Declare a plain element only expected while `gate` holds.
    pub fn declare_gated_element(
        &mut self,
        condition: SharedCondition,
        gate: SharedCondition,
    ) -> &mut Self {
        self.declare(Element::new(condition).with_gate(gate))
    }

    /// Declare a logical element: awaited on entry, absence never awaited.
    pub fn declare_logical_element(&mut self, condition: SharedCondition) -> &mut Self {
        self.declare(Element::logical(condition))
    }

    /// Declare a fully configured element.
    pub fn declare(&mut self, element: Element) -> &mut Self {
        if self.elements.iter().any(|e| e.id() == element.id()) {
            self.duplicate.get_or_insert_with(|| element.id().to_string());
        } else {
            self.elements.push(element);
        }
        self
    }

    /// Declare a condition awaited only when entering.
    pub fn declare_enter_condition(&mut self, condition: SharedCondition) -> &mut Self {
        self.enter_conditions.push(condition);
        self
    }

    /// Declare a condition awaited only when leaving. Unlike a logical
    /// element, this guarantees something about the state after exit.
    pub fn declare_exit_condition(&mut self, condition: SharedCondition) -> &mut Self {
        self.exit_conditions.push(condition);
        self
    }

    /// Ids declared so far.
    pub fn declared_ids(&self) -> HashSet<String> {
        self.elements.iter().map(|e| e.id().to_string()).collect()
    }

    /// Freeze the declarations.
    pub fn build(self) -> Result<Elements, BuildError> {
        if let Some(id) = self.duplicate {
            return Err(BuildError::DuplicateElement {
                state: self.owner,
                id,
            });
        }
        Ok(Elements::from_parts(
            self.elements,
            self.enter_conditions,
            self.exit_conditions,
        ))
    }
}
