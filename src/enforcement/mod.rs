//! Pre-flight enforcement of structural rules.
//!
//! Before a transition touches any phase, its origin, destination and host
//! are checked against the current phases and ownership. The checks use
//! Stillwater's `Validation` so that a misuse reports every broken rule at
//! once.
//!
//! # Example
//!
//! ```rust
//! use transit::builder::TransitionBuilder;
//! use transit::enforcement::{preflight, violations, PreflightContext, ViolationError};
//! use transit::engine::TransitSession;
//! use transit::config::TransitConfig;
//!
//! let mut session = TransitSession::new(TransitConfig::default()).unwrap();
//! let home = session.create_station("Home", |_| {}).unwrap();
//! let trip = TransitionBuilder::trip().from(home).to(home).build().unwrap();
//!
//! let found = violations(preflight(&PreflightContext {
//!     transition: &trip,
//!     states: session.states(),
//!     active_station: session.active_station(),
//!     tries: 1,
//! }));
//! assert!(found.contains(&ViolationError::SameOriginAndDestination {
//!     state: "<S1: Home>".to_string()
//! }));
//! ```

pub mod context;
pub mod rules;
pub mod violations;

pub use context::PreflightContext;
pub use rules::{preflight, violations, Check};
pub use violations::ViolationError;
