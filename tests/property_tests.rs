//! Property-based tests for phases, wait-sets and retries.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated inputs.

use proptest::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use transit::builder::{ElementsBuilder, TransitionBuilder};
use transit::config::TransitConfig;
use transit::core::{Elements, FnCondition, Phase};
use transit::engine::{
    active_stations, compute_wait_set, ConditionWait, ManualClock, OriginTag, TransitSession,
    TransitionOptions,
};

fn arbitrary_phase() -> impl Strategy<Value = Phase> {
    prop::sample::select(Phase::ORDER.to_vec())
}

/// Element ids mapped to whether the element is logical.
fn arbitrary_declarations() -> impl Strategy<Value = BTreeMap<u8, bool>> {
    prop::collection::btree_map(0..8u8, any::<bool>(), 0..6)
}

fn elements(name: &str, declarations: &BTreeMap<u8, bool>) -> Elements {
    let mut builder = ElementsBuilder::new(name);
    for (id, logical) in declarations {
        let condition = FnCondition::predicate(format!("e{}", id), || true).shared();
        if *logical {
            builder.declare_logical_element(condition);
        } else {
            builder.declare_element(condition);
        }
    }
    builder.build().unwrap()
}

fn ids(waits: &[ConditionWait], origin: OriginTag) -> HashSet<String> {
    waits
        .iter()
        .filter(|w| w.origin() == origin)
        .filter_map(|w| w.element_id().map(str::to_owned))
        .collect()
}

fn manual_session() -> TransitSession {
    let config = TransitConfig {
        default_timeout_ms: 20,
        poll_interval_ms: 10,
        ..TransitConfig::default()
    };
    TransitSession::with_clock(config, Arc::new(ManualClock::new())).unwrap()
}

proptest! {
    #[test]
    fn phase_only_advances_to_next(from in arbitrary_phase(), to in arbitrary_phase()) {
        prop_assert_eq!(from.can_advance_to(to), from.next() == Some(to));
    }

    #[test]
    fn exit_waits_skip_ids_the_destination_declares(
        origin in arbitrary_declarations(),
        destination in arbitrary_declarations(),
    ) {
        let leaving = elements("Origin", &origin);
        let entering = elements("Destination", &destination);

        let waits = compute_wait_set(&entering, &leaving, &entering.element_ids(), &[]);

        let expected_exits: HashSet<String> = origin
            .iter()
            .filter(|(id, logical)| !**logical && !destination.contains_key(*id))
            .map(|(id, _)| format!("e{}", id))
            .collect();
        let expected_enters: HashSet<String> =
            destination.keys().map(|id| format!("e{}", id)).collect();

        prop_assert_eq!(ids(&waits, OriginTag::Exit), expected_exits);
        prop_assert_eq!(ids(&waits, OriginTag::Enter), expected_enters);
        prop_assert_eq!(waits.len(), destination.len() + ids(&waits, OriginTag::Exit).len());
    }

    #[test]
    fn trips_keep_phases_monotonic_and_one_station_active(
        stations in 2..6usize,
        route in prop::collection::vec(0..6usize, 0..10),
    ) {
        let mut session = manual_session();
        let created: Vec<_> = (0..stations)
            .map(|i| session.create_station(format!("S{}", i), |_| {}).unwrap())
            .collect();
        session.enter_entry_point(created[0], || {}).unwrap();

        for next in route {
            let current = session.active_station().unwrap();
            let next = created[next % stations];
            let accepted = session.phase(next).unwrap() == Phase::New;
            prop_assert_eq!(session.travel_to(current, next, || {}).is_ok(), accepted);

            prop_assert_eq!(active_stations(session.states()).len(), 1);
            for state in session.states() {
                prop_assert!(state.history().is_monotonic());
                let path = state.history().get_path();
                prop_assert_eq!(&path[..], &Phase::ORDER[..path.len()]);
            }
        }
    }

    #[test]
    fn trigger_runs_exactly_tries_times_on_failure(tries in 1..6u32) {
        let mut session = manual_session();
        let station = session
            .create_station("Never", |e| {
                e.declare_element(FnCondition::predicate("never", || false).shared());
            })
            .unwrap();
        let transition = TransitionBuilder::trip()
            .to(station)
            .options(TransitionOptions::new().with_tries(tries))
            .build()
            .unwrap();

        let mut triggered = 0;
        let err = session.execute(transition, || triggered += 1).unwrap_err();

        prop_assert_eq!(triggered, tries);
        prop_assert_eq!(err.failure().unwrap().attempts, tries);
    }

    #[test]
    fn trigger_stops_once_a_try_succeeds(tries in 1..6u32, works_on in 1..6u32) {
        prop_assume!(works_on <= tries);
        let mut session = manual_session();
        let ready = Arc::new(AtomicBool::new(false));
        let shown = Arc::clone(&ready);
        let station = session
            .create_station("Flaky", |e| {
                e.declare_element(
                    FnCondition::predicate("flaky", move || shown.load(Ordering::SeqCst)).shared(),
                );
            })
            .unwrap();
        let transition = TransitionBuilder::trip()
            .to(station)
            .options(TransitionOptions::new().with_tries(tries))
            .build()
            .unwrap();

        let mut triggered = 0;
        let arrival = session
            .execute(transition, || {
                triggered += 1;
                if triggered == works_on {
                    ready.store(true, Ordering::SeqCst);
                }
            })
            .unwrap();

        prop_assert_eq!(triggered, works_on);
        prop_assert_eq!(arrival.attempts, works_on);
    }
}
