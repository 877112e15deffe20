//! The frozen set of elements and extra conditions a state declares.

use super::condition::SharedCondition;
use super::element::Element;
use std::collections::HashSet;

/// Everything that must hold while a conditional state is active.
///
/// Built once through [`crate::builder::ElementsBuilder`] and immutable
/// afterwards.
#[derive(Clone, Debug, Default)]
pub struct Elements {
    elements: Vec<Element>,
    enter_conditions: Vec<SharedCondition>,
    exit_conditions: Vec<SharedCondition>,
}

impl Elements {
    pub(crate) fn from_parts(
        elements: Vec<Element>,
        enter_conditions: Vec<SharedCondition>,
        exit_conditions: Vec<SharedCondition>,
    ) -> Self {
        Self {
            elements,
            enter_conditions,
            exit_conditions,
        }
    }

    /// Elements of a state that declares nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Combine the elements of several states.
    ///
    /// Elements are de-duplicated by id, keeping the first declaration.
    /// Extra enter and exit conditions are concatenated in order.
    pub fn gather<'a, I>(sources: I) -> Self
    where
        I: IntoIterator<Item = &'a Elements>,
    {
        let mut seen = HashSet::new();
        let mut gathered = Self::default();
        for source in sources {
            for element in &source.elements {
                if seen.insert(element.id().to_string()) {
                    gathered.elements.push(element.clone());
                }
            }
            gathered
                .enter_conditions
                .extend(source.enter_conditions.iter().cloned());
            gathered
                .exit_conditions
                .extend(source.exit_conditions.iter().cloned());
        }
        gathered
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Conditions awaited on entry in addition to the elements.
    pub fn enter_conditions(&self) -> &[SharedCondition] {
        &self.enter_conditions
    }

    /// Conditions awaited on exit in addition to the elements.
    pub fn exit_conditions(&self) -> &[SharedCondition] {
        &self.exit_conditions
    }

    pub fn element_ids(&self) -> HashSet<String> {
        self.elements.iter().map(|e| e.id().to_string()).collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.elements.iter().any(|e| e.id() == id)
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
            && self.enter_conditions.is_empty()
            && self.exit_conditions.is_empty()
    }
}
