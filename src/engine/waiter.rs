//! The polling barrier of a transition.
//!
//! The waiter samples every condition of a wait-set at a fixed interval
//! until all of them hold, one of them reports an error, or the timeout
//! elapses. It never waits on callbacks: the calling thread blocks and the
//! conditions are treated as synchronous predicates.

use crate::core::{ConditionStatus, SharedCondition, StatusKind};
use crate::engine::clock::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Why a condition is part of a wait-set.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum OriginTag {
    /// Presence of something the destination declares.
    Enter,
    /// Absence of something the origin declares.
    Exit,
    /// Supplied by the transition itself.
    Transition,
}

impl OriginTag {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Enter => "ENTER",
            Self::Exit => "EXIT",
            Self::Transition => "TRANSITION",
        }
    }
}

impl fmt::Display for OriginTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A run of identical consecutive statuses observed for one condition.
///
/// Times are relative to the start of the wait.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusRun {
    pub kind: StatusKind,
    pub message: Option<String>,
    pub first: Duration,
    pub last: Duration,
    pub count: u32,
}

impl fmt::Display for StatusRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<3} {:>5}-{:>5}ms ({}x)",
            self.kind.tag(),
            self.first.as_millis(),
            self.last.as_millis(),
            self.count
        )?;
        if let Some(message) = &self.message {
            write!(f, " {}", message)?;
        }
        Ok(())
    }
}

/// One condition of a wait-set, tagged with where it came from.
#[derive(Clone, Debug)]
pub struct ConditionWait {
    condition: SharedCondition,
    origin: OriginTag,
    element_id: Option<String>,
    description: String,
    latest: Option<ConditionStatus>,
    fulfilled: bool,
    history: Vec<StatusRun>,
}

impl ConditionWait {
    pub fn new(condition: SharedCondition, origin: OriginTag) -> Self {
        let description = condition.description();
        Self {
            condition,
            origin,
            element_id: None,
            description,
            latest: None,
            fulfilled: false,
            history: Vec::new(),
        }
    }

    /// Wait derived from a declared element.
    pub fn for_element(
        condition: SharedCondition,
        origin: OriginTag,
        id: impl Into<String>,
    ) -> Self {
        Self {
            element_id: Some(id.into()),
            ..Self::new(condition, origin)
        }
    }

    pub fn condition(&self) -> &SharedCondition {
        &self.condition
    }

    pub fn origin(&self) -> OriginTag {
        self.origin
    }

    pub fn element_id(&self) -> Option<&str> {
        self.element_id.as_deref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Last status observed, `None` before the first check.
    pub fn latest(&self) -> Option<&ConditionStatus> {
        self.latest.as_ref()
    }

    pub fn is_fulfilled(&self) -> bool {
        self.fulfilled
    }

    pub fn history(&self) -> &[StatusRun] {
        &self.history
    }

    /// Forget the outcome of a previous try. History is kept.
    pub(crate) fn reset(&mut self) {
        self.fulfilled = false;
        self.latest = None;
    }

    fn sample(&mut self, at: Duration) -> StatusKind {
        let status = self.condition.check();
        let kind = status.kind();
        match self.history.last_mut() {
            Some(run) if run.kind == kind && run.message.as_deref() == status.message() => {
                run.last = at;
                run.count += 1;
            }
            _ => self.history.push(StatusRun {
                kind,
                message: status.message().map(str::to_owned),
                first: at,
                last: at,
                count: 1,
            }),
        }
        self.fulfilled = status.is_fulfilled();
        self.latest = Some(status);
        kind
    }
}

/// How a wait ended when not every condition was fulfilled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitFailure {
    /// The deadline passed.
    Timeout { elapsed: Duration },
    /// The condition at `index` reported an error.
    ConditionError { index: usize, elapsed: Duration },
}

/// Outcome of a successful wait.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaitSummary {
    pub elapsed: Duration,
    pub polls: u32,
}

/// Polls a wait-set until it is satisfied or the timeout elapses.
pub struct ConditionWaiter<'a> {
    clock: &'a dyn Clock,
    poll_interval: Duration,
}

impl<'a> ConditionWaiter<'a> {
    pub fn new(clock: &'a dyn Clock, poll_interval: Duration) -> Self {
        Self {
            clock,
            poll_interval,
        }
    }

    /// Block until every wait is fulfilled.
    ///
    /// A condition observed fulfilled is not checked again during this
    /// wait. Conditions are checked once more at the deadline before the
    /// wait gives up. A timeout too large to be represented as an instant
    /// has no deadline.
    pub fn wait(
        &self,
        waits: &mut [ConditionWait],
        timeout: Duration,
    ) -> Result<WaitSummary, WaitFailure> {
        let start = self.clock.now();
        let deadline = start.checked_add(timeout);
        waits.iter_mut().for_each(ConditionWait::reset);

        let mut polls = 0;
        loop {
            polls += 1;
            let at = self.clock.now().saturating_duration_since(start);
            for (index, wait) in waits.iter_mut().enumerate() {
                if wait.is_fulfilled() {
                    continue;
                }
                if wait.sample(at) == StatusKind::Error {
                    return Err(WaitFailure::ConditionError { index, elapsed: at });
                }
            }
            if waits.iter().all(ConditionWait::is_fulfilled) {
                return Ok(WaitSummary { elapsed: at, polls });
            }

            let now = self.clock.now();
            let pause = match deadline {
                Some(deadline) if now >= deadline => {
                    return Err(WaitFailure::Timeout {
                        elapsed: now.saturating_duration_since(start),
                    });
                }
                Some(deadline) => self.poll_interval.min(deadline.saturating_duration_since(now)),
                None => self.poll_interval,
            };
            self.clock.sleep(pause);
        }
    }

    /// Check every wait exactly once, without sleeping.
    pub fn check_once(&self, waits: &mut [ConditionWait]) -> bool {
        waits.iter_mut().for_each(ConditionWait::reset);
        for wait in waits.iter_mut() {
            wait.sample(Duration::ZERO);
        }
        waits.iter().all(ConditionWait::is_fulfilled)
    }
}

/// One line of the diagnostic dump.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConditionStatusRow {
    pub index: usize,
    pub origin: OriginTag,
    pub element_id: Option<String>,
    pub description: String,
    pub fulfilled: bool,
    pub status: Option<ConditionStatus>,
    pub history: Vec<StatusRun>,
}

/// Status of every condition of a wait-set at the end of a wait.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionStatusTable {
    rows: Vec<ConditionStatusRow>,
}

impl ConditionStatusTable {
    pub fn from_waits(waits: &[ConditionWait]) -> Self {
        let rows = waits
            .iter()
            .enumerate()
            .map(|(index, wait)| ConditionStatusRow {
                index: index + 1,
                origin: wait.origin(),
                element_id: wait.element_id().map(str::to_owned),
                description: wait.description().to_string(),
                fulfilled: wait.is_fulfilled(),
                status: wait.latest().cloned(),
                history: wait.history().to_vec(),
            })
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[ConditionStatusRow] {
        &self.rows
    }

    pub fn all_fulfilled(&self) -> bool {
        self.rows.iter().all(|r| r.fulfilled)
    }

    pub fn unfulfilled(&self) -> impl Iterator<Item = &ConditionStatusRow> {
        self.rows.iter().filter(|r| !r.fulfilled)
    }

    /// Rows with the given origin tag.
    pub fn with_origin(&self, origin: OriginTag) -> impl Iterator<Item = &ConditionStatusRow> {
        self.rows.iter().filter(move |r| r.origin == origin)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for ConditionStatusTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rows.is_empty() {
            return writeln!(f, "    (no conditions)");
        }
        for row in &self.rows {
            let tag = match (&row.status, row.fulfilled) {
                (None, _) => "--",
                (Some(_), true) => "OK",
                (Some(status), false) => status.kind().tag(),
            };
            write!(
                f,
                "  {:>3}. [{:<10}] [{:<3}] {}",
                row.index,
                row.origin.name(),
                tag,
                row.description
            )?;
            if let Some(message) = row.status.as_ref().and_then(ConditionStatus::message) {
                write!(f, ": {}", message)?;
            }
            writeln!(f)?;
            for run in &row.history {
                writeln!(f, "         {}", run)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FnCondition;
    use crate::engine::clock::ManualClock;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const POLL: Duration = Duration::from_millis(10);

    fn wait_for<F>(description: &str, check: F) -> ConditionWait
    where
        F: Fn() -> ConditionStatus + Send + Sync + 'static,
    {
        ConditionWait::new(FnCondition::new(description, check).shared(), OriginTag::Enter)
    }

    #[test]
    fn empty_wait_set_succeeds_immediately() {
        let clock = ManualClock::new();
        let waiter = ConditionWaiter::new(&clock, POLL);

        let summary = waiter.wait(&mut [], Duration::from_millis(50)).unwrap();

        assert_eq!(summary.polls, 1);
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }

    #[test]
    fn waits_until_condition_holds() {
        let clock = Arc::new(ManualClock::new());
        let observed = Arc::clone(&clock);
        let mut waits = [wait_for("ready after 30ms", move || {
            ConditionStatus::from_bool(observed.elapsed() >= Duration::from_millis(30))
        })];

        let waiter = ConditionWaiter::new(clock.as_ref(), POLL);
        let summary = waiter.wait(&mut waits, Duration::from_secs(1)).unwrap();

        assert_eq!(summary.elapsed, Duration::from_millis(30));
        assert_eq!(summary.polls, 4);
        assert!(waits[0].is_fulfilled());
    }

    #[test]
    fn times_out_at_deadline() {
        let clock = ManualClock::new();
        let mut waits = [wait_for("never", ConditionStatus::not_fulfilled)];

        let waiter = ConditionWaiter::new(&clock, POLL);
        let failure = waiter.wait(&mut waits, Duration::from_millis(50)).unwrap_err();

        assert_eq!(
            failure,
            WaitFailure::Timeout {
                elapsed: Duration::from_millis(50)
            }
        );
        assert!(!waits[0].is_fulfilled());
    }

    #[test]
    fn unbounded_timeout_does_not_overflow() {
        let clock = Arc::new(ManualClock::new());
        let observed = Arc::clone(&clock);
        let mut waits = [
            wait_for("shown", ConditionStatus::fulfilled),
            wait_for("ready after 20ms", move || {
                ConditionStatus::from_bool(observed.elapsed() >= Duration::from_millis(20))
            }),
        ];

        let waiter = ConditionWaiter::new(clock.as_ref(), POLL);
        let summary = waiter.wait(&mut waits, Duration::MAX).unwrap();

        assert_eq!(summary.elapsed, Duration::from_millis(20));
        assert_eq!(summary.polls, 3);
    }

    #[test]
    fn already_fulfilled_wait_with_max_timeout() {
        let clock = ManualClock::new();
        let mut waits = [wait_for("shown", ConditionStatus::fulfilled)];

        let waiter = ConditionWaiter::new(&clock, POLL);
        let summary = waiter.wait(&mut waits, Duration::MAX).unwrap();

        assert_eq!(summary.polls, 1);
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }

    #[test]
    fn condition_error_ends_wait_early() {
        let clock = ManualClock::new();
        let mut waits = [
            wait_for("fine", ConditionStatus::fulfilled),
            wait_for("broken", || ConditionStatus::error("view detached")),
        ];

        let waiter = ConditionWaiter::new(&clock, POLL);
        let failure = waiter.wait(&mut waits, Duration::from_secs(1)).unwrap_err();

        assert_eq!(
            failure,
            WaitFailure::ConditionError {
                index: 1,
                elapsed: Duration::ZERO
            }
        );
    }

    #[test]
    fn fulfilled_conditions_are_not_rechecked() {
        let clock = ManualClock::new();
        let checks = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&checks);
        let mut waits = [
            wait_for("once", move || {
                counted.fetch_add(1, Ordering::SeqCst);
                ConditionStatus::fulfilled()
            }),
            wait_for("never", ConditionStatus::not_fulfilled),
        ];

        let waiter = ConditionWaiter::new(&clock, POLL);
        let _ = waiter.wait(&mut waits, Duration::from_millis(40));

        assert_eq!(checks.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn history_collapses_identical_statuses() {
        let clock = Arc::new(ManualClock::new());
        let observed = Arc::clone(&clock);
        let mut waits = [wait_for("flips at 20ms", move || {
            if observed.elapsed() >= Duration::from_millis(20) {
                ConditionStatus::fulfilled()
            } else {
                ConditionStatus::not_fulfilled_with("hidden")
            }
        })];

        let waiter = ConditionWaiter::new(clock.as_ref(), POLL);
        waiter.wait(&mut waits, Duration::from_secs(1)).unwrap();

        let history = waits[0].history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].kind, StatusKind::NotFulfilled);
        assert_eq!(history[0].count, 2);
        assert_eq!(history[0].last, Duration::from_millis(10));
        assert_eq!(history[1].kind, StatusKind::Fulfilled);
        assert_eq!(history[1].first, Duration::from_millis(20));
    }

    #[test]
    fn check_once_does_not_sleep() {
        let clock = ManualClock::new();
        let mut waits = [
            wait_for("yes", ConditionStatus::fulfilled),
            wait_for("no", ConditionStatus::not_fulfilled),
        ];

        let waiter = ConditionWaiter::new(&clock, POLL);

        assert!(!waiter.check_once(&mut waits));
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }

    #[test]
    fn table_lists_every_condition() {
        let clock = ManualClock::new();
        let mut waits = [
            wait_for("shown", ConditionStatus::fulfilled),
            ConditionWait::for_element(
                FnCondition::new("Not: home-button", || {
                    ConditionStatus::not_fulfilled_with("still visible")
                })
                .shared(),
                OriginTag::Exit,
                "home-button",
            ),
        ];

        let waiter = ConditionWaiter::new(&clock, POLL);
        let _ = waiter.wait(&mut waits, Duration::from_millis(20));
        let table = ConditionStatusTable::from_waits(&waits);

        assert_eq!(table.rows().len(), 2);
        assert!(!table.all_fulfilled());
        let unfulfilled: Vec<_> = table.unfulfilled().collect();
        assert_eq!(unfulfilled.len(), 1);
        assert_eq!(unfulfilled[0].element_id.as_deref(), Some("home-button"));
        assert_eq!(table.with_origin(OriginTag::Exit).count(), 1);

        let dump = table.to_string();
        assert!(dump.contains("[ENTER     ] [OK ] shown"));
        assert!(dump.contains("[EXIT      ] [NO ] Not: home-button: still visible"));
    }

    #[test]
    fn table_serializes_to_json() {
        let mut waits = [wait_for("shown", ConditionStatus::fulfilled)];
        let clock = ManualClock::new();
        ConditionWaiter::new(&clock, POLL).check_once(&mut waits);

        let json = ConditionStatusTable::from_waits(&waits).to_json().unwrap();
        let parsed: ConditionStatusTable = serde_json::from_str(&json).unwrap();

        assert!(parsed.all_fulfilled());
    }
}
