//! Background execution of geocoding and location lookups.
//!
//! Each request runs on its own short-lived thread and reports back with
//! exactly one event on the channel. The UI thread polls the receiving
//! end between input events and never blocks on the network. Search
//! events carry the slot generation observed when the request was
//! spawned, so the screen can recognize completions that no longer
//! describe the slot's contents.

use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;

use crate::model::{Place, Slot};

use super::{GeoError, Geocoder, Locator};

/// A completion delivered to the UI loop.
#[derive(Debug)]
pub enum GeoEvent {
    /// A forward geocode finished for `slot`.
    Search {
        slot: Slot,
        generation: u64,
        outcome: Result<Vec<Place>, GeoError>,
    },

    /// The startup locate-then-reverse chain finished.
    Prefill(Result<Place, GeoError>),
}

/// Spawns lookup workers and hands their completions to the channel.
pub struct Resolver {
    geocoder: Arc<dyn Geocoder>,
    locator: Arc<dyn Locator>,
    events: Sender<GeoEvent>,
}

impl Resolver {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        locator: Arc<dyn Locator>,
        events: Sender<GeoEvent>,
    ) -> Self {
        Self {
            geocoder,
            locator,
            events,
        }
    }

    /// Forward-geocodes `query` for `slot` in the background.
    pub fn spawn_search(&self, slot: Slot, generation: u64, query: String) {
        let geocoder = Arc::clone(&self.geocoder);
        let events = self.events.clone();
        thread::spawn(move || {
            let outcome = geocoder.search(&query);
            // The receiver is gone only during shutdown; nothing to do then.
            let _ = events.send(GeoEvent::Search {
                slot,
                generation,
                outcome,
            });
        });
    }

    /// Fixes the current position and reverse-geocodes it, in the background.
    pub fn spawn_prefill(&self) {
        let geocoder = Arc::clone(&self.geocoder);
        let locator = Arc::clone(&self.locator);
        let events = self.events.clone();
        thread::spawn(move || {
            let outcome = locate_and_reverse(locator.as_ref(), geocoder.as_ref());
            let _ = events.send(GeoEvent::Prefill(outcome));
        });
    }
}

/// Position fix, then the address nearest to it.
fn locate_and_reverse(
    locator: &dyn Locator,
    geocoder: &dyn Geocoder,
) -> Result<Place, GeoError> {
    let coordinates = locator.locate()?;
    tracing::debug!(
        latitude = coordinates.latitude,
        longitude = coordinates.longitude,
        "position fix"
    );
    geocoder.reverse(coordinates)?.ok_or(GeoError::NoAddress)
}
