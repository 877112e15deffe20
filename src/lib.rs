//! Transit: state-transition synchronization for UI tests
//!
//! Transit models an application under test as stations (top-level screens)
//! and facilities (dialogs, menus and other sub-states owned by a station).
//! Each state declares once what is true while it is active; a transition
//! between states derives from those declarations what to wait for, runs a
//! trigger, and blocks until the UI has caught up.
//!
//! # Core Concepts
//!
//! - **Elements**: Declared facts about a state, awaited on entry and, for
//!   plain elements, awaited to disappear on exit
//! - **Phases**: NEW, TRANSITIONING_TO, ACTIVE, TRANSITIONING_FROM, FINISHED
//! - **Transitions**: Trips between stations and facility check-ins/outs
//! - **Session**: The explicit context holding every state and the single
//!   active station
//!
//! # Example
//!
//! ```rust
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::sync::Arc;
//! use transit::{FnCondition, Phase, TransitConfig, TransitSession};
//!
//! let dialog_open = Arc::new(AtomicBool::new(false));
//! let mut session = TransitSession::new(TransitConfig::default()).unwrap();
//!
//! let home = session.create_station("Home", |_| {}).unwrap();
//! let open = Arc::clone(&dialog_open);
//! let dialog = session
//!     .create_facility(home, "Dialog", |e| {
//!         e.declare_element(
//!             FnCondition::predicate("dialog-ok", move || open.load(Ordering::SeqCst)).shared(),
//!         );
//!     })
//!     .unwrap();
//!
//! session.enter_entry_point(home, || {}).unwrap();
//! session
//!     .enter_facility(home, dialog, || dialog_open.store(true, Ordering::SeqCst))
//!     .unwrap();
//! session
//!     .exit_facility(home, dialog, || dialog_open.store(false, Ordering::SeqCst))
//!     .unwrap();
//!
//! assert_eq!(session.phase(dialog).unwrap(), Phase::Finished);
//! assert_eq!(session.phase(home).unwrap(), Phase::Active);
//! ```

pub mod builder;
pub mod config;
pub mod core;
pub mod enforcement;
pub mod engine;

// Re-export commonly used types
pub use builder::{BuildError, ElementsBuilder, TransitionBuilder};
pub use config::TransitConfig;
pub use core::{Condition, ConditionStatus, FnCondition, Phase, StateId};
pub use engine::{Arrival, TransitError, TransitSession, TransitionOptions};
