//! Geocoding and location services.
//!
//! The entry screen talks to these through the [`Geocoder`] and
//! [`Locator`] traits so tests can script outcomes without a network. The
//! live implementations call a Nominatim-compatible geocoder and an
//! IP-geolocation endpoint over plain blocking HTTP; [`CachedGeocoder`]
//! keeps a local SQLite copy of forward lookups. [`Resolver`] runs any of
//! them off the UI thread and reports back over a channel.

mod cache;
mod locate;
mod nominatim;
mod resolver;

pub use cache::{CacheError, CachedGeocoder, GeoCache};
pub use locate::IpLocator;
pub use nominatim::NominatimClient;
pub use resolver::{GeoEvent, Resolver};

use std::time::Duration;

use crate::model::{Coordinates, Place};

/// How long a single lookup may take before it fails as a transport error.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Identifies this client to the services, per the public Nominatim usage
/// policy.
const USER_AGENT: &str = concat!("wayfarer/", env!("CARGO_PKG_VERSION"));

/// Errors from the geocoding and location services.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GeoError {
    /// The service answered with a non-success HTTP status.
    #[error("service returned HTTP {0}")]
    Status(u16),

    /// The request never produced a response: DNS, connect, or timeout.
    #[error("request failed: {0}")]
    Transport(String),

    /// The response arrived but could not be understood.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// A position was fixed but no address is known for it.
    #[error("no address known for this position")]
    NoAddress,
}

impl From<ureq::Error> for GeoError {
    fn from(error: ureq::Error) -> Self {
        match error {
            ureq::Error::Status(code, _) => GeoError::Status(code),
            ureq::Error::Transport(transport) => GeoError::Transport(transport.to_string()),
        }
    }
}

/// Forward and reverse geocoding.
pub trait Geocoder: Send + Sync {
    /// Free-text address search. An empty vec means the service had no
    /// match for the query.
    fn search(&self, query: &str) -> Result<Vec<Place>, GeoError>;

    /// Coordinate to nearest known address. `Ok(None)` when the service
    /// knows nothing about the position.
    fn reverse(&self, coordinates: Coordinates) -> Result<Option<Place>, GeoError>;
}

/// One-shot fix of the machine's current position.
pub trait Locator: Send + Sync {
    fn locate(&self) -> Result<Coordinates, GeoError>;
}
