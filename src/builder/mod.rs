//! Builder API for declaring elements and transitions.
//!
//! Element declarations are frozen by [`ElementsBuilder::build`];
//! transitions are validated for completeness by
//! [`TransitionBuilder::build`]. Whether a transition makes sense for the
//! current phases is checked later, when it is executed.

pub mod elements;
pub mod error;
pub mod transition;

pub use elements::ElementsBuilder;
pub use error::BuildError;
pub use transition::TransitionBuilder;
