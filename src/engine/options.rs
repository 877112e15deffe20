//! Per-transition timing options.

use crate::config::TransitConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing and retry options of one transition.
///
/// Unset fields fall back to the session's [`TransitConfig`].
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use transit::engine::TransitionOptions;
///
/// let options = TransitionOptions::new()
///     .with_tries(3)
///     .with_timeout(Duration::from_millis(500));
/// assert_eq!(options.tries, Some(3));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOptions {
    /// How many times the trigger may run. Must be at least 1.
    pub tries: Option<u32>,
    /// How long each try waits for the wait-set.
    pub timeout: Option<Duration>,
    /// When false, fail if every condition already holds before the trigger.
    pub possibly_already_fulfilled: Option<bool>,
}

/// Options with every fallback applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ResolvedOptions {
    pub tries: u32,
    pub timeout: Duration,
    pub possibly_already_fulfilled: bool,
}

impl TransitionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tries(mut self, tries: u32) -> Self {
        self.tries = Some(tries);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_timeout_ms(self, timeout_ms: u64) -> Self {
        self.with_timeout(Duration::from_millis(timeout_ms))
    }

    /// Require that the wait-set is not already satisfied before the trigger.
    pub fn expect_not_yet_fulfilled(mut self) -> Self {
        self.possibly_already_fulfilled = Some(false);
        self
    }

    pub(crate) fn resolve(&self, config: &TransitConfig) -> ResolvedOptions {
        ResolvedOptions {
            tries: self.tries.unwrap_or(config.default_tries),
            timeout: self.timeout.unwrap_or_else(|| config.default_timeout()),
            possibly_already_fulfilled: self
                .possibly_already_fulfilled
                .unwrap_or(config.possibly_already_fulfilled),
        }
    }
}
