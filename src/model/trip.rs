//! The trip under construction: three slots and the route they produce.

use std::mem;

use thiserror::Error;

use super::{Place, Slot, SlotState};

/// The trip does not have the minimum shape for a route.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("a resolved start and at least one resolved stop are required")]
pub struct RouteError;

/// An ordered point on the route handed to the directions screen.
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub label: &'static str,
    pub place: Place,
}

/// The trip under construction: one state record per slot.
///
/// Slot records are created once and live for the screen's lifetime; only
/// their contents change.
#[derive(Debug, Default)]
pub struct Trip {
    start: SlotState,
    first_stop: SlotState,
    second_stop: SlotState,
}

impl Trip {
    pub fn slot(&self, slot: Slot) -> &SlotState {
        match slot {
            Slot::Start => &self.start,
            Slot::FirstStop => &self.first_stop,
            Slot::SecondStop => &self.second_stop,
        }
    }

    pub fn slot_mut(&mut self, slot: Slot) -> &mut SlotState {
        match slot {
            Slot::Start => &mut self.start,
            Slot::FirstStop => &mut self.first_stop,
            Slot::SecondStop => &mut self.second_stop,
        }
    }

    /// Exchanges the two stop slots in a single mutation: text, resolution,
    /// and the resolved mark that derives from it all move together. Both
    /// slots' in-flight requests are invalidated, since a completion
    /// spawned for one position must not land on the other.
    pub fn swap_stops(&mut self) {
        mem::swap(&mut self.first_stop, &mut self.second_stop);
        self.first_stop.invalidate();
        self.second_stop.invalidate();
    }

    /// True when the minimum route shape holds: a resolved start plus at
    /// least one resolved stop.
    pub fn is_routable(&self) -> bool {
        self.start.is_resolved()
            && (self.first_stop.is_resolved() || self.second_stop.is_resolved())
    }

    /// Builds the ordered route: start first, then each resolved stop in
    /// form order. A stop that resolved to a place already on the route is
    /// dropped rather than visited twice.
    pub fn route(&self) -> Result<Vec<Waypoint>, RouteError> {
        if !self.is_routable() {
            return Err(RouteError);
        }

        let mut waypoints: Vec<Waypoint> = Vec::new();
        for slot in Slot::ALL {
            let Some(place) = self.slot(slot).resolved_place() else {
                continue;
            };
            if waypoints.iter().any(|w| w.place == *place) {
                continue;
            }
            waypoints.push(Waypoint {
                label: slot.label(),
                place: place.clone(),
            });
        }
        Ok(waypoints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Coordinates, Resolution};

    fn sample_place(address: &str, latitude: f64) -> Place {
        Place {
            address: address.to_string(),
            coordinates: Coordinates {
                latitude,
                longitude: 0.0,
            },
        }
    }

    fn resolve(trip: &mut Trip, slot: Slot, place: Place) {
        let state = trip.slot_mut(slot);
        state.text = place.address.clone();
        let generation = state.begin_resolving();
        assert!(state.complete(generation, place));
    }

    /// Builds a trip with the given slots resolved to distinct places.
    fn trip_with(start: bool, first: bool, second: bool) -> Trip {
        let mut trip = Trip::default();
        if start {
            resolve(&mut trip, Slot::Start, sample_place("start", 1.0));
        }
        if first {
            resolve(&mut trip, Slot::FirstStop, sample_place("first", 2.0));
        }
        if second {
            resolve(&mut trip, Slot::SecondStop, sample_place("second", 3.0));
        }
        trip
    }

    #[test]
    fn routability_truth_table() {
        let cases = [
            (false, false, false, false),
            (false, false, true, false),
            (false, true, false, false),
            (false, true, true, false),
            (true, false, false, false),
            (true, false, true, true),
            (true, true, false, true),
            (true, true, true, true),
        ];
        for (start, first, second, expected) in cases {
            let trip = trip_with(start, first, second);
            assert_eq!(
                trip.is_routable(),
                expected,
                "start={start} first={first} second={second}"
            );
        }
    }

    #[test]
    fn unresolved_text_does_not_count_toward_validity() {
        let mut trip = trip_with(true, false, false);
        trip.slot_mut(Slot::FirstStop).text = "typed but never confirmed".to_string();

        assert!(!trip.is_routable());
        assert_eq!(trip.route(), Err(RouteError));
    }

    #[test]
    fn route_orders_start_then_stops() {
        let trip = trip_with(true, false, true);

        let route = trip.route().unwrap();
        let labels: Vec<&str> = route.iter().map(|w| w.label).collect();
        assert_eq!(labels, ["Start", "Second stop"]);
    }

    #[test]
    fn route_drops_duplicate_places() {
        let mut trip = Trip::default();
        resolve(&mut trip, Slot::Start, sample_place("depot", 1.0));
        resolve(&mut trip, Slot::FirstStop, sample_place("market", 2.0));
        resolve(&mut trip, Slot::SecondStop, sample_place("market", 2.0));

        let route = trip.route().unwrap();
        let labels: Vec<&str> = route.iter().map(|w| w.label).collect();
        assert_eq!(labels, ["Start", "First stop"]);
    }

    #[test]
    fn swap_exchanges_stop_state_completely() {
        let mut trip = Trip::default();
        resolve(&mut trip, Slot::FirstStop, sample_place("resolved stop", 2.0));
        trip.slot_mut(Slot::SecondStop).text = "just text".to_string();

        trip.swap_stops();

        assert_eq!(trip.slot(Slot::FirstStop).text, "just text");
        assert!(!trip.slot(Slot::FirstStop).is_resolved());
        assert_eq!(trip.slot(Slot::SecondStop).text, "resolved stop");
        assert_eq!(
            trip.slot(Slot::SecondStop)
                .resolved_place()
                .map(|p| p.address.as_str()),
            Some("resolved stop")
        );
    }

    #[test]
    fn swap_twice_restores_observable_state() {
        let mut trip = Trip::default();
        resolve(&mut trip, Slot::FirstStop, sample_place("a", 2.0));
        trip.slot_mut(Slot::SecondStop).text = "b".to_string();

        trip.swap_stops();
        trip.swap_stops();

        assert_eq!(trip.slot(Slot::FirstStop).text, "a");
        assert!(trip.slot(Slot::FirstStop).is_resolved());
        assert_eq!(trip.slot(Slot::SecondStop).text, "b");
        assert!(!trip.slot(Slot::SecondStop).is_resolved());
    }

    #[test]
    fn swap_cancels_in_flight_stop_requests() {
        let mut trip = Trip::default();
        trip.slot_mut(Slot::FirstStop).text = "pending".to_string();
        let generation = trip.slot_mut(Slot::FirstStop).begin_resolving();

        trip.swap_stops();

        // The request's state record now sits in the second slot; neither
        // position may accept the stale completion.
        assert!(!trip
            .slot_mut(Slot::FirstStop)
            .complete(generation, sample_place("late", 9.0)));
        assert!(!trip
            .slot_mut(Slot::SecondStop)
            .complete(generation, sample_place("late", 9.0)));
        assert_eq!(
            trip.slot(Slot::SecondStop).resolution(),
            &Resolution::Empty
        );
    }
}
