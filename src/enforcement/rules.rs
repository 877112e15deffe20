//! Pre-flight rules for transitions using Validation.

use crate::core::{ConditionalState, Phase, StateId};
use crate::enforcement::context::PreflightContext;
use crate::enforcement::violations::ViolationError;
use crate::engine::TransitionKind;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Result of one check; failures carry every violation found.
pub type Check = Validation<(), NonEmptyVec<ViolationError>>;

/// Check that a transition fits the current phases and ownership.
///
/// All rules run; the failure carries every violation rather than only the
/// first one.
pub fn preflight(ctx: &PreflightContext<'_>) -> Check {
    let mut checks = vec![require(ctx.tries >= 1, || ViolationError::InvalidTries)];
    let transition = ctx.transition;

    match transition.kind() {
        TransitionKind::Trip => {
            if let Some(destination) = lookup(ctx, transition.destination(), &mut checks) {
                checks.push(is_station(destination));
                checks.push(in_phase(destination, Phase::New));
            }
            match transition.origin() {
                Some(origin_id) => {
                    checks.push(require(transition.destination() != Some(origin_id), || {
                        ViolationError::SameOriginAndDestination {
                            state: ctx.describe(Some(origin_id)),
                        }
                    }));
                    if let Some(origin) = lookup(ctx, Some(origin_id), &mut checks) {
                        checks.push(is_station(origin));
                        checks.push(in_phase(origin, Phase::Active));
                        checks.push(require(ctx.active_station == Some(origin_id), || {
                            ViolationError::NotActiveStation {
                                origin: origin.to_string(),
                                active: ctx.describe(ctx.active_station),
                            }
                        }));
                    }
                }
                None => checks.push(require(ctx.active_station.is_none(), || {
                    ViolationError::StationAlreadyActive {
                        active: ctx.describe(ctx.active_station),
                    }
                })),
            }
        }
        TransitionKind::FacilityCheckIn => {
            if let Some(host) = active_host(ctx, &mut checks) {
                facility_of(ctx, host, transition.destination(), Phase::New, &mut checks);
            }
        }
        TransitionKind::FacilityCheckOut => {
            if let Some(host) = active_host(ctx, &mut checks) {
                facility_of(ctx, host, transition.origin(), Phase::Active, &mut checks);
            }
        }
        TransitionKind::FacilitySwap => {
            checks.push(require(transition.origin() != transition.destination(), || {
                ViolationError::SameOriginAndDestination {
                    state: ctx.describe(transition.origin()),
                }
            }));
            if let Some(host) = active_host(ctx, &mut checks) {
                facility_of(ctx, host, transition.origin(), Phase::Active, &mut checks);
                facility_of(ctx, host, transition.destination(), Phase::New, &mut checks);
            }
        }
    }

    Validation::all_vec(checks).map(|_| ())
}

/// Collect the violations of a failed check.
pub fn violations(check: Check) -> Vec<ViolationError> {
    match check {
        Validation::Success(_) => Vec::new(),
        Validation::Failure(errors) => errors.iter().cloned().collect(),
    }
}

fn require<F>(ok: bool, violation: F) -> Check
where
    F: FnOnce() -> ViolationError,
{
    if ok {
        Validation::success(())
    } else {
        Validation::fail(violation())
    }
}

fn lookup<'a>(
    ctx: &PreflightContext<'a>,
    id: Option<StateId>,
    checks: &mut Vec<Check>,
) -> Option<&'a ConditionalState> {
    let id = id?;
    let state = ctx.state(id);
    if state.is_none() {
        checks.push(Validation::fail(ViolationError::UnknownState { id }));
    }
    state
}

fn is_station(state: &ConditionalState) -> Check {
    require(state.is_station(), || ViolationError::NotAStation {
        state: state.to_string(),
    })
}

fn in_phase(state: &ConditionalState, expected: Phase) -> Check {
    require(state.phase() == expected, || ViolationError::WrongPhase {
        state: state.to_string(),
        expected,
        actual: state.phase(),
    })
}

fn active_host<'a>(
    ctx: &PreflightContext<'a>,
    checks: &mut Vec<Check>,
) -> Option<&'a ConditionalState> {
    let host = lookup(ctx, ctx.transition.host(), checks)?;
    checks.push(is_station(host));
    checks.push(in_phase(host, Phase::Active));
    Some(host)
}

fn facility_of(
    ctx: &PreflightContext<'_>,
    host: &ConditionalState,
    facility: Option<StateId>,
    expected: Phase,
    checks: &mut Vec<Check>,
) {
    let Some(facility) = lookup(ctx, facility, checks) else {
        return;
    };
    match facility.host() {
        None => checks.push(Validation::fail(ViolationError::NotAFacility {
            state: facility.to_string(),
        })),
        Some(actual) => {
            checks.push(require(actual == host.id(), || {
                ViolationError::ForeignFacility {
                    facility: facility.to_string(),
                    claimed_host: host.to_string(),
                    actual_host: ctx.describe(Some(actual)),
                }
            }));
            checks.push(in_phase(facility, expected));
        }
    }
}
