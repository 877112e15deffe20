//! Core types of the transit model.
//!
//! This module contains the declarative half of the engine:
//! - Phases and their history
//! - Conditions and the status they report
//! - Elements declared by a state
//! - Stations and facilities as conditional states
//!
//! Nothing here waits or sleeps; driving states through their phases is the
//! job of [`crate::engine`].

mod condition;
mod element;
mod elements;
mod phase;
mod state;

pub use condition::{
    Condition, ConditionStatus, FnCondition, GatedCondition, NegatedCondition, SharedCondition,
    StatusKind,
};
pub use element::{Element, ElementKind};
pub use elements::Elements;
pub use phase::{Phase, PhaseChange, PhaseHistory};
pub use state::{ConditionalState, StateId, StateKind};

pub(crate) use state::PhaseOrderError;
