//! Running transitions.
//!
//! A [`TransitSession`] owns every station and facility of a test session.
//! Each transition embarks its states, computes the wait-set from their
//! declared elements, runs the caller's trigger and polls the wait-set with
//! a [`ConditionWaiter`] until it holds or the timeout elapses.

mod clock;
mod error;
mod monitoring;
mod options;
mod resolve;
mod session;
mod traffic;
mod transition;
mod waiter;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::TransitError;
pub use options::TransitionOptions;
pub use resolve::compute_wait_set;
pub use session::TransitSession;
pub use traffic::{active_stations, TrafficControl};
pub use transition::{Arrival, Transition, TransitionFailure, TransitionKind};
pub use waiter::{
    ConditionStatusRow, ConditionStatusTable, ConditionWait, ConditionWaiter, OriginTag,
    StatusRun, WaitFailure, WaitSummary,
};
