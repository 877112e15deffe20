//! Conditions: named facts about the system that can be checked.
//!
//! A condition is the unit the engine waits on. Implementations usually
//! inspect some external state (a view hierarchy, a flag, a counter); the
//! engine only relies on the [`Condition`] contract.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Shared handle to a condition.
///
/// Conditions are immutable once declared, so the same handle can appear in
/// a state's elements and in any number of wait-sets.
pub type SharedCondition = Arc<dyn Condition>;

/// Outcome class of a single condition check.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum StatusKind {
    /// The fact holds.
    Fulfilled,
    /// The fact does not hold yet.
    NotFulfilled,
    /// The check itself failed; waiting longer will not help.
    Error,
}

impl StatusKind {
    /// Short tag used in diagnostic tables.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Fulfilled => "OK",
            Self::NotFulfilled => "NO",
            Self::Error => "ERR",
        }
    }
}

/// Result of checking a condition once.
///
/// # Example
///
/// ```rust
/// use transit::core::ConditionStatus;
///
/// let status = ConditionStatus::not_fulfilled_with("button hidden");
/// assert!(!status.is_fulfilled());
/// assert_eq!(status.message(), Some("button hidden"));
///
/// assert!(ConditionStatus::from_bool(true).is_fulfilled());
/// ```
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ConditionStatus {
    kind: StatusKind,
    message: Option<String>,
}

impl ConditionStatus {
    pub fn fulfilled() -> Self {
        Self {
            kind: StatusKind::Fulfilled,
            message: None,
        }
    }

    pub fn fulfilled_with(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Fulfilled,
            message: Some(message.into()),
        }
    }

    pub fn not_fulfilled() -> Self {
        Self {
            kind: StatusKind::NotFulfilled,
            message: None,
        }
    }

    pub fn not_fulfilled_with(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::NotFulfilled,
            message: Some(message.into()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            message: Some(message.into()),
        }
    }

    pub fn from_bool(fulfilled: bool) -> Self {
        if fulfilled {
            Self::fulfilled()
        } else {
            Self::not_fulfilled()
        }
    }

    pub fn kind(&self) -> StatusKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_fulfilled(&self) -> bool {
        self.kind == StatusKind::Fulfilled
    }

    pub fn is_error(&self) -> bool {
        self.kind == StatusKind::Error
    }
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "[{}] {}", self.kind.tag(), message),
            None => write!(f, "[{}]", self.kind.tag()),
        }
    }
}

/// A checkable fact about the system.
///
/// `check` must be cheap and side-effect free: it is re-sampled at every
/// poll tick. `on_start_monitoring` and `on_stop_monitoring` bracket the
/// period during which the condition is part of an in-flight transition and
/// always come in pairs.
pub trait Condition: Send + Sync {
    /// Human-readable description, also the default element id.
    fn description(&self) -> String;

    /// Check whether the fact currently holds.
    fn check(&self) -> ConditionStatus;

    /// Called once before the transition's trigger runs.
    fn on_start_monitoring(&self) {}

    /// Called once after the wait ends, whatever its outcome.
    fn on_stop_monitoring(&self) {}
}

impl fmt::Debug for dyn Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("description", &self.description())
            .finish()
    }
}

/// Condition backed by a closure.
///
/// # Example
///
/// ```rust
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
/// use transit::core::{Condition, FnCondition};
///
/// let shown = Arc::new(AtomicBool::new(false));
/// let flag = Arc::clone(&shown);
/// let condition = FnCondition::predicate("dialog shown", move || flag.load(Ordering::SeqCst));
///
/// assert!(!condition.check().is_fulfilled());
/// shown.store(true, Ordering::SeqCst);
/// assert!(condition.check().is_fulfilled());
/// ```
pub struct FnCondition {
    description: String,
    check: Box<dyn Fn() -> ConditionStatus + Send + Sync>,
}

impl FnCondition {
    /// Create a condition from a closure returning a full status.
    pub fn new<F>(description: impl Into<String>, check: F) -> Self
    where
        F: Fn() -> ConditionStatus + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            check: Box::new(check),
        }
    }

    /// Create a condition from a boolean predicate.
    pub fn predicate<F>(description: impl Into<String>, predicate: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Self::new(description, move || ConditionStatus::from_bool(predicate()))
    }

    /// Wrap into a [`SharedCondition`].
    pub fn shared(self) -> SharedCondition {
        Arc::new(self)
    }
}

impl Condition for FnCondition {
    fn description(&self) -> String {
        self.description.clone()
    }

    fn check(&self) -> ConditionStatus {
        (self.check)()
    }
}

/// Holds when `inner` holds, or trivially when `gate` does not.
///
/// The gate is evaluated at every check, so an element can become expected
/// mid-wait.
pub struct GatedCondition {
    inner: SharedCondition,
    gate: SharedCondition,
}

impl GatedCondition {
    pub fn new(inner: SharedCondition, gate: SharedCondition) -> Self {
        Self { inner, gate }
    }
}

impl Condition for GatedCondition {
    fn description(&self) -> String {
        format!("{} (gated by: {})", self.inner.description(), self.gate.description())
    }

    fn check(&self) -> ConditionStatus {
        let gate = self.gate.check();
        match gate.kind() {
            StatusKind::Fulfilled => self.inner.check(),
            StatusKind::NotFulfilled => ConditionStatus::fulfilled_with("gate not open"),
            StatusKind::Error => gate,
        }
    }

    fn on_start_monitoring(&self) {
        self.gate.on_start_monitoring();
        self.inner.on_start_monitoring();
    }

    fn on_stop_monitoring(&self) {
        self.inner.on_stop_monitoring();
        self.gate.on_stop_monitoring();
    }
}

/// Holds when `inner` does not. Errors pass through unchanged.
pub struct NegatedCondition {
    inner: SharedCondition,
}

impl NegatedCondition {
    pub fn new(inner: SharedCondition) -> Self {
        Self { inner }
    }
}

impl Condition for NegatedCondition {
    fn description(&self) -> String {
        format!("Not: {}", self.inner.description())
    }

    fn check(&self) -> ConditionStatus {
        let status = self.inner.check();
        let message = status.message().map(str::to_owned);
        match (status.kind(), message) {
            (StatusKind::Error, _) => status,
            (StatusKind::Fulfilled, Some(m)) => ConditionStatus::not_fulfilled_with(m),
            (StatusKind::Fulfilled, None) => ConditionStatus::not_fulfilled(),
            (StatusKind::NotFulfilled, Some(m)) => ConditionStatus::fulfilled_with(m),
            (StatusKind::NotFulfilled, None) => ConditionStatus::fulfilled(),
        }
    }

    fn on_start_monitoring(&self) {
        self.inner.on_start_monitoring();
    }

    fn on_stop_monitoring(&self) {
        self.inner.on_stop_monitoring();
    }
}
