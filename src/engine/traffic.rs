//! Tracking of the active station.

use crate::core::{ConditionalState, Phase, StateId};
use tracing::{debug, error};

/// Registry of stations and the single active one.
///
/// Owned by a [`crate::engine::TransitSession`]; there is no process-wide
/// instance.
#[derive(Clone, Debug, Default)]
pub struct TrafficControl {
    active_station: Option<StateId>,
    created_stations: Vec<StateId>,
}

impl TrafficControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly created station and return its number.
    ///
    /// Numbers start at 1 and never repeat within a session.
    pub fn notify_created_station(&mut self, station: StateId) -> u64 {
        self.created_stations.push(station);
        let number = self.created_stations.len() as u64;
        debug!(station = %station, number, "station created");
        number
    }

    /// Record `station` as the active station after a trip arrived.
    ///
    /// Fails with the ids of every station found ACTIVE if that is not
    /// exactly `station`.
    pub fn notify_active_station_changed(
        &mut self,
        station: StateId,
        states: &[ConditionalState],
    ) -> Result<(), Vec<StateId>> {
        let active = active_stations(states);
        if active != [station] {
            error!(
                station = %station,
                active = ?active,
                "single active station invariant violated"
            );
            return Err(active);
        }
        debug!(from = ?self.active_station, to = %station, "active station changed");
        self.active_station = Some(station);
        Ok(())
    }

    pub fn active_station(&self) -> Option<StateId> {
        self.active_station
    }

    pub fn created_stations(&self) -> &[StateId] {
        &self.created_stations
    }
}

/// Ids of all stations currently in the ACTIVE phase.
pub fn active_stations(states: &[ConditionalState]) -> Vec<StateId> {
    states
        .iter()
        .filter(|s| s.is_station() && s.phase() == Phase::Active)
        .map(ConditionalState::id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Elements, StateKind};

    fn station(index: usize, phase_steps: usize) -> ConditionalState {
        let mut state = ConditionalState::new(
            StateId(index),
            format!("S{}", index),
            StateKind::Station {
                number: index as u64 + 1,
                facilities: Vec::new(),
            },
            Elements::empty(),
        );
        for phase in &Phase::ORDER[1..=phase_steps] {
            state.advance_phase(*phase, 1).unwrap();
        }
        state
    }

    #[test]
    fn station_numbers_increment() {
        let mut traffic = TrafficControl::new();
        assert_eq!(traffic.notify_created_station(StateId(0)), 1);
        assert_eq!(traffic.notify_created_station(StateId(4)), 2);
        assert_eq!(traffic.created_stations(), &[StateId(0), StateId(4)]);
    }

    #[test]
    fn records_single_active_station() {
        let mut traffic = TrafficControl::new();
        let states = vec![station(0, 4), station(1, 2)];

        traffic.notify_active_station_changed(StateId(1), &states).unwrap();

        assert_eq!(traffic.active_station(), Some(StateId(1)));
    }

    #[test]
    fn two_active_stations_violate_invariant() {
        let mut traffic = TrafficControl::new();
        let states = vec![station(0, 2), station(1, 2)];

        let err = traffic
            .notify_active_station_changed(StateId(1), &states)
            .unwrap_err();

        assert_eq!(err, vec![StateId(0), StateId(1)]);
        assert_eq!(traffic.active_station(), None);
    }

    #[test]
    fn inactive_destination_violates_invariant() {
        let mut traffic = TrafficControl::new();
        let states = vec![station(0, 1)];

        assert!(traffic
            .notify_active_station_changed(StateId(0), &states)
            .is_err());
    }
}
