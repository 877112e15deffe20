//! The orchestration context that owns every state of a test session.

use crate::builder::{ElementsBuilder, TransitionBuilder};
use crate::config::TransitConfig;
use crate::core::{ConditionalState, Elements, Phase, PhaseOrderError, StateId, StateKind};
use crate::enforcement::{preflight, violations, PreflightContext, ViolationError};
use crate::engine::clock::{Clock, SystemClock};
use crate::engine::error::TransitError;
use crate::engine::monitoring::MonitoringScope;
use crate::engine::resolve::compute_wait_set;
use crate::engine::traffic::{active_stations, TrafficControl};
use crate::engine::transition::{Arrival, Transition, TransitionFailure, TransitionKind};
use crate::engine::waiter::{
    ConditionStatusTable, ConditionWait, ConditionWaiter, OriginTag, WaitFailure,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

/// Owns the stations and facilities of one test session and runs the
/// transitions between them.
///
/// There is no process-wide state: two sessions never see each other's
/// stations, and the single-active-station invariant is checked per session.
///
/// # Example
///
/// ```rust
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
/// use transit::config::TransitConfig;
/// use transit::core::{FnCondition, Phase};
/// use transit::engine::TransitSession;
///
/// let on_settings = Arc::new(AtomicBool::new(false));
/// let mut session = TransitSession::new(TransitConfig::default()).unwrap();
///
/// let shown = Arc::clone(&on_settings);
/// let home = session
///     .create_station("Home", |e| {
///         let visible = move || !shown.load(Ordering::SeqCst);
///         e.declare_element(FnCondition::predicate("home-button", visible).shared());
///     })
///     .unwrap();
/// let shown = Arc::clone(&on_settings);
/// let settings = session
///     .create_station("Settings", |e| {
///         let visible = move || shown.load(Ordering::SeqCst);
///         e.declare_element(FnCondition::predicate("settings-title", visible).shared());
///     })
///     .unwrap();
///
/// session.enter_entry_point(home, || {}).unwrap();
/// session
///     .travel_to(home, settings, || on_settings.store(true, Ordering::SeqCst))
///     .unwrap();
///
/// assert_eq!(session.phase(home).unwrap(), Phase::Finished);
/// assert_eq!(session.active_station(), Some(settings));
/// ```
pub struct TransitSession {
    id: Uuid,
    config: TransitConfig,
    clock: Arc<dyn Clock>,
    states: Vec<ConditionalState>,
    traffic: TrafficControl,
    transitions: u64,
}

impl TransitSession {
    /// Create a session that polls on the wall clock.
    pub fn new(config: TransitConfig) -> Result<Self, TransitError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a session that polls on `clock`.
    pub fn with_clock(config: TransitConfig, clock: Arc<dyn Clock>) -> Result<Self, TransitError> {
        config.validate()?;
        let id = Uuid::new_v4();
        debug!(session = %id, "transit session created");
        Ok(Self {
            id,
            config,
            clock,
            states: Vec::new(),
            traffic: TrafficControl::new(),
            transitions: 0,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &TransitConfig {
        &self.config
    }

    /// Every state created so far, indexed by [`StateId::index`].
    pub fn states(&self) -> &[ConditionalState] {
        &self.states
    }

    pub fn state(&self, id: StateId) -> Result<&ConditionalState, TransitError> {
        self.states
            .get(id.index())
            .ok_or_else(|| TransitError::structural(ViolationError::UnknownState { id }))
    }

    pub fn phase(&self, id: StateId) -> Result<Phase, TransitError> {
        self.state(id).map(ConditionalState::phase)
    }

    pub fn traffic(&self) -> &TrafficControl {
        &self.traffic
    }

    pub fn active_station(&self) -> Option<StateId> {
        self.traffic.active_station()
    }

    /// Create a station; `declare` receives the builder for its elements.
    pub fn create_station<F>(
        &mut self,
        name: impl Into<String>,
        declare: F,
    ) -> Result<StateId, TransitError>
    where
        F: FnOnce(&mut ElementsBuilder),
    {
        let name = name.into();
        let elements = declare_elements(&name, declare)?;
        let id = StateId(self.states.len());
        let number = self.traffic.notify_created_station(id);
        let station = ConditionalState::new(
            id,
            name,
            StateKind::Station {
                number,
                facilities: Vec::new(),
            },
            elements,
        );
        info!(session = %self.id, station = %station, "station created");
        self.states.push(station);
        Ok(id)
    }

    /// Create a facility of `host`. It joins the host on check-in.
    pub fn create_facility<F>(
        &mut self,
        host: StateId,
        name: impl Into<String>,
        declare: F,
    ) -> Result<StateId, TransitError>
    where
        F: FnOnce(&mut ElementsBuilder),
    {
        let station = self.host_station(host)?;
        if station.phase() == Phase::Finished {
            return Err(TransitError::structural(ViolationError::WrongPhase {
                state: station.to_string(),
                expected: Phase::Active,
                actual: Phase::Finished,
            }));
        }
        self.push_facility(host, name.into(), declare)
    }

    /// Create a facility entered together with `host`, which must be NEW.
    ///
    /// The facility's elements are awaited by the trip into the host, and the
    /// facility becomes ACTIVE when the host does.
    pub fn create_initial_facility<F>(
        &mut self,
        host: StateId,
        name: impl Into<String>,
        declare: F,
    ) -> Result<StateId, TransitError>
    where
        F: FnOnce(&mut ElementsBuilder),
    {
        let station = self.host_station(host)?;
        if station.phase() != Phase::New {
            return Err(TransitError::structural(ViolationError::WrongPhase {
                state: station.to_string(),
                expected: Phase::New,
                actual: station.phase(),
            }));
        }
        let id = self.push_facility(host, name.into(), declare)?;
        self.state_mut(host)?.register_facility(id);
        Ok(id)
    }

    /// Trip into `station` while no station is active.
    pub fn enter_entry_point<F>(
        &mut self,
        station: StateId,
        trigger: F,
    ) -> Result<Arrival, TransitError>
    where
        F: FnMut(),
    {
        let transition = TransitionBuilder::trip().to(station).build()?;
        self.execute(transition, trigger)
    }

    /// Trip from the active station `origin` to `destination`.
    pub fn travel_to<F>(
        &mut self,
        origin: StateId,
        destination: StateId,
        trigger: F,
    ) -> Result<Arrival, TransitError>
    where
        F: FnMut(),
    {
        let transition = TransitionBuilder::trip()
            .from(origin)
            .to(destination)
            .build()?;
        self.execute(transition, trigger)
    }

    /// Check into `facility` on the active station `host`.
    pub fn enter_facility<F>(
        &mut self,
        host: StateId,
        facility: StateId,
        trigger: F,
    ) -> Result<Arrival, TransitError>
    where
        F: FnMut(),
    {
        let transition = TransitionBuilder::check_in()
            .at(host)
            .to(facility)
            .build()?;
        self.execute(transition, trigger)
    }

    /// Check out of `facility` on the active station `host`.
    pub fn exit_facility<F>(
        &mut self,
        host: StateId,
        facility: StateId,
        trigger: F,
    ) -> Result<Arrival, TransitError>
    where
        F: FnMut(),
    {
        let transition = TransitionBuilder::check_out()
            .at(host)
            .from(facility)
            .build()?;
        self.execute(transition, trigger)
    }

    /// Leave facility `from` and enter facility `to`, both on `host`.
    pub fn swap_facility<F>(
        &mut self,
        host: StateId,
        from: StateId,
        to: StateId,
        trigger: F,
    ) -> Result<Arrival, TransitError>
    where
        F: FnMut(),
    {
        let transition = TransitionBuilder::swap().at(host).from(from).to(to).build()?;
        self.execute(transition, trigger)
    }

    /// Run `transition`: embark, trigger, wait, arrive.
    ///
    /// A timed-out try re-runs the trigger until the tries are used up. On
    /// failure the states stay in their TRANSITIONING phase.
    pub fn execute<F>(
        &mut self,
        transition: Transition,
        mut trigger: F,
    ) -> Result<Arrival, TransitError>
    where
        F: FnMut(),
    {
        self.transitions += 1;
        let number = self.transitions;
        let options = transition.options().resolve(&self.config);
        let span = info_span!(
            "transition",
            session = %self.id,
            id = number,
            kind = %transition.kind()
        );
        let _entered = span.enter();

        let found = violations(preflight(&PreflightContext {
            transition: &transition,
            states: &self.states,
            active_station: self.traffic.active_station(),
            tries: options.tries,
        }));
        if !found.is_empty() {
            warn!(violations = found.len(), "transition rejected");
            return Err(TransitError::Structural { violations: found });
        }

        let label = self.describe(&transition, number);
        info!(
            transition = %label,
            tries = options.tries,
            timeout_ms = options.timeout.as_millis() as u64,
            "transition started"
        );

        self.embark(&transition, number)?;
        let mut waits = self.wait_set(&transition)?;
        for wait in &waits {
            debug!(origin = %wait.origin(), condition = wait.description(), "awaiting");
        }

        let monitoring = MonitoringScope::start(&waits);
        let clock = Arc::clone(&self.clock);
        let waiter = ConditionWaiter::new(clock.as_ref(), self.config.poll_interval());

        if !options.possibly_already_fulfilled && waiter.check_once(&mut waits) {
            warn!(transition = %label, "conditions fulfilled before the trigger");
            return Err(TransitError::AlreadyFulfilled(failure(
                label,
                0,
                Duration::ZERO,
                "was already fulfilled before the trigger".to_string(),
                &waits,
            )));
        }

        let mut attempts = 0;
        let summary = loop {
            attempts += 1;
            trigger();
            match waiter.wait(&mut waits, options.timeout) {
                Ok(summary) => break summary,
                Err(WaitFailure::Timeout { elapsed }) if attempts < options.tries => {
                    warn!(
                        attempt = attempts,
                        tries = options.tries,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "try timed out, retrying"
                    );
                }
                Err(WaitFailure::Timeout { elapsed }) => {
                    warn!(transition = %label, attempts, "transition timed out");
                    return Err(TransitError::Timeout(failure(
                        label,
                        attempts,
                        elapsed,
                        "timed out".to_string(),
                        &waits,
                    )));
                }
                Err(WaitFailure::ConditionError { index, elapsed }) => {
                    warn!(
                        transition = %label,
                        condition = index + 1,
                        "condition reported an error"
                    );
                    return Err(TransitError::ConditionError(failure(
                        label,
                        attempts,
                        elapsed,
                        format!("failed: condition {} reported an error", index + 1),
                        &waits,
                    )));
                }
            }
        };

        self.arrive(&transition, number)?;
        monitoring.stop();

        if let (TransitionKind::Trip, Some(destination)) =
            (transition.kind(), transition.destination())
        {
            let changed = self
                .traffic
                .notify_active_station_changed(destination, &self.states);
            if let Err(active) = changed {
                let active = active.into_iter().map(|id| self.describe_state(id)).collect();
                return Err(TransitError::InvariantViolation { active });
            }
        }

        info!(
            transition = %label,
            attempts,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            polls = summary.polls,
            "transition arrived"
        );
        if self.config.transition_pause_ms > 0 {
            self.clock.sleep(self.config.transition_pause());
        }

        Ok(Arrival {
            transition: number,
            kind: transition.kind(),
            attempts,
            elapsed: summary.elapsed,
            report: ConditionStatusTable::from_waits(&waits),
        })
    }

    /// Check once that an ACTIVE state's elements are still present.
    pub fn recheck_active_conditions(
        &self,
        id: StateId,
    ) -> Result<ConditionStatusTable, TransitError> {
        let state = self.state(id)?;
        if state.phase() != Phase::Active {
            return Err(TransitError::structural(ViolationError::WrongPhase {
                state: state.to_string(),
                expected: Phase::Active,
                actual: state.phase(),
            }));
        }

        let mut waits: Vec<ConditionWait> = state
            .elements()
            .elements()
            .iter()
            .map(|e| ConditionWait::for_element(e.enter_condition(), OriginTag::Enter, e.id()))
            .collect();
        let waiter = ConditionWaiter::new(self.clock.as_ref(), self.config.poll_interval());
        if waiter.check_once(&mut waits) {
            return Ok(ConditionStatusTable::from_waits(&waits));
        }

        warn!(state = %state, "active conditions no longer hold");
        Err(TransitError::ConditionsNotHeld(failure(
            format!("Recheck {}", state),
            1,
            Duration::ZERO,
            "has conditions that no longer hold".to_string(),
            &waits,
        )))
    }

    /// Assert that `station` is where the session ended up.
    pub fn assert_final_destination(&self, station: StateId) -> Result<(), TransitError> {
        let state = self.state(station)?;
        if !state.is_station() {
            return Err(TransitError::structural(ViolationError::NotAStation {
                state: state.to_string(),
            }));
        }
        if state.phase() != Phase::Active {
            return Err(TransitError::structural(ViolationError::WrongPhase {
                state: state.to_string(),
                expected: Phase::Active,
                actual: state.phase(),
            }));
        }
        if self.traffic.active_station() != Some(station) {
            return Err(TransitError::structural(ViolationError::NotActiveStation {
                origin: state.to_string(),
                active: self.describe_optional(self.traffic.active_station()),
            }));
        }
        let active = active_stations(&self.states);
        if active != [station] {
            error!(station = %state, active = ?active, "single active station invariant violated");
            return Err(TransitError::InvariantViolation {
                active: active.into_iter().map(|id| self.describe_state(id)).collect(),
            });
        }
        Ok(())
    }

    fn host_station(&self, host: StateId) -> Result<&ConditionalState, TransitError> {
        let station = self.state(host)?;
        if !station.is_station() {
            return Err(TransitError::structural(ViolationError::NotAStation {
                state: station.to_string(),
            }));
        }
        Ok(station)
    }

    fn push_facility<F>(
        &mut self,
        host: StateId,
        name: String,
        declare: F,
    ) -> Result<StateId, TransitError>
    where
        F: FnOnce(&mut ElementsBuilder),
    {
        let elements = declare_elements(&name, declare)?;
        let id = StateId(self.states.len());
        let facility = ConditionalState::new(id, name, StateKind::Facility { host }, elements);
        info!(session = %self.id, facility = %facility, "facility created");
        self.states.push(facility);
        Ok(id)
    }

    fn state_mut(&mut self, id: StateId) -> Result<&mut ConditionalState, TransitError> {
        self.states
            .get_mut(id.index())
            .ok_or_else(|| TransitError::structural(ViolationError::UnknownState { id }))
    }

    fn advance(&mut self, id: StateId, to: Phase, transition: u64) -> Result<(), TransitError> {
        let state = self.state_mut(id)?;
        if let Err(PhaseOrderError { from, to }) = state.advance_phase(to, transition) {
            return Err(TransitError::structural(ViolationError::PhaseOrder {
                state: state.to_string(),
                from,
                to,
            }));
        }
        debug!(state = %state, phase = %to, "phase changed");
        Ok(())
    }

    /// Advance a station and every registered facility currently in `from`.
    fn cascade(
        &mut self,
        station: StateId,
        from: Phase,
        to: Phase,
        transition: u64,
    ) -> Result<(), TransitError> {
        self.advance(station, to, transition)?;
        for facility in self.facilities_in(station, from)? {
            self.advance(facility, to, transition)?;
        }
        Ok(())
    }

    fn facilities_in(&self, station: StateId, phase: Phase) -> Result<Vec<StateId>, TransitError> {
        Ok(self
            .state(station)?
            .facilities()
            .iter()
            .copied()
            .filter(|f| self.states.get(f.index()).map(ConditionalState::phase) == Some(phase))
            .collect())
    }

    fn embark(&mut self, transition: &Transition, number: u64) -> Result<(), TransitError> {
        match transition.kind() {
            TransitionKind::Trip => {
                if let Some(origin) = transition.origin() {
                    self.cascade(origin, Phase::Active, Phase::TransitioningFrom, number)?;
                }
                if let Some(destination) = transition.destination() {
                    self.cascade(destination, Phase::New, Phase::TransitioningTo, number)?;
                }
            }
            TransitionKind::FacilityCheckIn => {
                if let (Some(host), Some(facility)) =
                    (transition.host(), transition.destination())
                {
                    self.state_mut(host)?.register_facility(facility);
                    self.advance(facility, Phase::TransitioningTo, number)?;
                }
            }
            TransitionKind::FacilityCheckOut => {
                if let Some(facility) = transition.origin() {
                    self.advance(facility, Phase::TransitioningFrom, number)?;
                }
            }
            TransitionKind::FacilitySwap => {
                if let (Some(host), Some(from), Some(to)) =
                    (transition.host(), transition.origin(), transition.destination())
                {
                    self.advance(from, Phase::TransitioningFrom, number)?;
                    self.state_mut(host)?.register_facility(to);
                    self.advance(to, Phase::TransitioningTo, number)?;
                }
            }
        }
        Ok(())
    }

    fn arrive(&mut self, transition: &Transition, number: u64) -> Result<(), TransitError> {
        match transition.kind() {
            TransitionKind::Trip => {
                if let Some(origin) = transition.origin() {
                    self.cascade(origin, Phase::TransitioningFrom, Phase::Finished, number)?;
                }
                if let Some(destination) = transition.destination() {
                    self.cascade(destination, Phase::TransitioningTo, Phase::Active, number)?;
                }
            }
            TransitionKind::FacilityCheckIn
            | TransitionKind::FacilityCheckOut
            | TransitionKind::FacilitySwap => {
                if let Some(from) = transition.origin() {
                    self.advance(from, Phase::Finished, number)?;
                }
                if let Some(to) = transition.destination() {
                    self.advance(to, Phase::Active, number)?;
                }
            }
        }
        Ok(())
    }

    /// Gather the elements of `ids` plus their facilities in `phase`.
    fn gather(&self, ids: &[StateId], phase: Phase) -> Result<Elements, TransitError> {
        let mut sources = Vec::new();
        for &id in ids {
            sources.push(id);
            if self.state(id)?.is_station() {
                sources.extend(self.facilities_in(id, phase)?);
            }
        }
        let mut elements = Vec::with_capacity(sources.len());
        for id in sources {
            elements.push(self.state(id)?.elements());
        }
        Ok(Elements::gather(elements))
    }

    /// Ids still declared after the transition by the host and its other
    /// ACTIVE facilities.
    fn staying_ids(&self, host: StateId) -> Result<HashSet<String>, TransitError> {
        let mut ids = self.state(host)?.elements().element_ids();
        for facility in self.facilities_in(host, Phase::Active)? {
            ids.extend(self.state(facility)?.elements().element_ids());
        }
        Ok(ids)
    }

    /// Wait-set of an embarked transition.
    fn wait_set(&self, transition: &Transition) -> Result<Vec<ConditionWait>, TransitError> {
        let origin: Vec<StateId> = transition.origin().into_iter().collect();
        let destination: Vec<StateId> = transition.destination().into_iter().collect();

        let (entering, leaving, persisting) = match transition.kind() {
            TransitionKind::Trip => {
                let entering = self.gather(&destination, Phase::TransitioningTo)?;
                let leaving = self.gather(&origin, Phase::TransitioningFrom)?;
                let persisting = entering.element_ids();
                (entering, leaving, persisting)
            }
            TransitionKind::FacilityCheckIn => (
                self.gather(&destination, Phase::TransitioningTo)?,
                Elements::empty(),
                HashSet::new(),
            ),
            TransitionKind::FacilityCheckOut | TransitionKind::FacilitySwap => {
                let entering = self.gather(&destination, Phase::TransitioningTo)?;
                let leaving = self.gather(&origin, Phase::TransitioningFrom)?;
                let mut persisting = entering.element_ids();
                if let Some(host) = transition.host() {
                    persisting.extend(self.staying_ids(host)?);
                }
                (entering, leaving, persisting)
            }
        };

        Ok(compute_wait_set(
            &entering,
            &leaving,
            &persisting,
            transition.conditions(),
        ))
    }

    fn describe(&self, transition: &Transition, number: u64) -> String {
        let mut label = format!(
            "{} #{} {} -> {}",
            transition.kind(),
            number,
            self.describe_optional(transition.origin()),
            self.describe_optional(transition.destination())
        );
        if let Some(host) = transition.host() {
            label.push_str(" at ");
            label.push_str(&self.describe_state(host));
        }
        label
    }

    fn describe_state(&self, id: StateId) -> String {
        self.states
            .get(id.index())
            .map(ToString::to_string)
            .unwrap_or_else(|| id.to_string())
    }

    fn describe_optional(&self, id: Option<StateId>) -> String {
        id.map(|id| self.describe_state(id))
            .unwrap_or_else(|| "none".to_string())
    }
}

fn declare_elements<F>(name: &str, declare: F) -> Result<Elements, TransitError>
where
    F: FnOnce(&mut ElementsBuilder),
{
    let mut builder = ElementsBuilder::new(name);
    declare(&mut builder);
    Ok(builder.build()?)
}

fn failure(
    transition: String,
    attempts: u32,
    elapsed: Duration,
    reason: String,
    waits: &[ConditionWait],
) -> Box<TransitionFailure> {
    Box::new(TransitionFailure {
        transition,
        attempts,
        elapsed,
        reason,
        report: ConditionStatusTable::from_waits(waits),
    })
}
