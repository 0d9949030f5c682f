//! Local cache of forward-geocode results.
//!
//! The public Nominatim usage policy asks clients to cache, and cached
//! queries keep working offline. One `SQLite` file holds a row per
//! normalized query; rows older than the configured age are pruned when
//! the cache is opened.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use jiff::Timestamp;
use rusqlite::{Connection, OptionalExtension};

use crate::model::{Coordinates, Place};

use super::{GeoError, Geocoder};

const SECONDS_PER_DAY: i64 = 86_400;

/// Errors from cache operations. The cache never takes the app down;
/// callers log these and fall through to the live service.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("corrupt cache row: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// SQLite-backed store of search results keyed by normalized query text.
pub struct GeoCache {
    conn: Mutex<Connection>,
}

impl GeoCache {
    /// Opens the cache at `path`, creating it if needed, and prunes rows
    /// older than `max_age_days`.
    pub fn open(path: &Path, max_age_days: u32) -> Result<Self, CacheError> {
        let cache = Self::from_connection(Connection::open(path)?)?;
        cache.prune(max_age_days)?;
        Ok(cache)
    }

    fn from_connection(conn: Connection) -> Result<Self, CacheError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS geocode (
                 query     TEXT PRIMARY KEY,
                 places    TEXT NOT NULL,
                 cached_at INTEGER NOT NULL
             )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Looks up a query. `None` on miss; a hit may carry an empty result
    /// set, which is itself a cached answer.
    pub fn lookup(&self, query: &str) -> Result<Option<Vec<Place>>, CacheError> {
        let row: Option<String> = self
            .conn()
            .query_row(
                "SELECT places FROM geocode WHERE query = ?1",
                [normalize(query)],
                |row| row.get(0),
            )
            .optional()?;
        match row {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Stores a result set for a query, replacing any earlier row.
    pub fn store(&self, query: &str, places: &[Place]) -> Result<(), CacheError> {
        self.store_at(query, places, Timestamp::now().as_second())
    }

    fn store_at(&self, query: &str, places: &[Place], cached_at: i64) -> Result<(), CacheError> {
        let json = serde_json::to_string(places)?;
        self.conn().execute(
            "INSERT OR REPLACE INTO geocode (query, places, cached_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![normalize(query), json, cached_at],
        )?;
        Ok(())
    }

    /// Deletes rows older than `max_age_days`.
    fn prune(&self, max_age_days: u32) -> Result<(), CacheError> {
        let cutoff = Timestamp::now().as_second() - i64::from(max_age_days) * SECONDS_PER_DAY;
        self.conn()
            .execute("DELETE FROM geocode WHERE cached_at < ?1", [cutoff])?;
        Ok(())
    }

    // A poisoned lock just means another thread panicked mid-operation;
    // the connection itself is still usable.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Cache keys are case-insensitive with collapsed whitespace, so that
/// "Berlin" and " berlin " hit the same row.
fn normalize(query: &str) -> String {
    query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// A geocoder that consults the local cache before the live service.
///
/// Cache failures are logged and bypassed. Reverse lookups always go
/// live, since fixed positions rarely repeat exactly.
pub struct CachedGeocoder<G> {
    inner: G,
    cache: GeoCache,
}

impl<G: Geocoder> CachedGeocoder<G> {
    pub fn new(inner: G, cache: GeoCache) -> Self {
        Self { inner, cache }
    }
}

impl<G: Geocoder> Geocoder for CachedGeocoder<G> {
    fn search(&self, query: &str) -> Result<Vec<Place>, GeoError> {
        match self.cache.lookup(query) {
            Ok(Some(places)) => {
                tracing::debug!(query, "geocode cache hit");
                return Ok(places);
            }
            Ok(None) => {}
            Err(error) => tracing::warn!(error = %error, "geocode cache read failed"),
        }
        let places = self.inner.search(query)?;
        if let Err(error) = self.cache.store(query, &places) {
            tracing::warn!(error = %error, "geocode cache write failed");
        }
        Ok(places)
    }

    fn reverse(&self, coordinates: Coordinates) -> Result<Option<Place>, GeoError> {
        self.inner.reverse(coordinates)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn test_cache() -> GeoCache {
        GeoCache::from_connection(Connection::open_in_memory().unwrap()).unwrap()
    }

    fn sample_places(n: usize) -> Vec<Place> {
        (0..n)
            .map(|i| Place {
                address: format!("Candidate {i}"),
                coordinates: Coordinates {
                    latitude: 50.0 + i as f64,
                    longitude: 8.0,
                },
            })
            .collect()
    }

    /// Geocoder that counts live searches and always returns the same set.
    struct CountingGeocoder {
        places: Vec<Place>,
        searches: AtomicUsize,
    }

    impl CountingGeocoder {
        fn new(places: Vec<Place>) -> Self {
            Self {
                places,
                searches: AtomicUsize::new(0),
            }
        }
    }

    impl Geocoder for CountingGeocoder {
        fn search(&self, _query: &str) -> Result<Vec<Place>, GeoError> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            Ok(self.places.clone())
        }

        fn reverse(&self, _coordinates: Coordinates) -> Result<Option<Place>, GeoError> {
            Ok(self.places.first().cloned())
        }
    }

    #[test]
    fn store_then_lookup_round_trips() {
        let cache = test_cache();
        let places = sample_places(2);

        cache.store("Hauptbahnhof Berlin", &places).unwrap();
        let hit = cache.lookup("Hauptbahnhof Berlin").unwrap();

        assert_eq!(hit, Some(places));
    }

    #[test]
    fn lookup_normalizes_queries() {
        let cache = test_cache();
        cache.store("Hauptbahnhof  Berlin", &sample_places(1)).unwrap();

        assert!(cache.lookup("  hauptbahnhof berlin ").unwrap().is_some());
        assert!(cache.lookup("hauptbahnhof").unwrap().is_none());
    }

    #[test]
    fn empty_result_sets_are_cached_answers() {
        let cache = test_cache();
        cache.store("nowhere at all", &[]).unwrap();

        assert_eq!(cache.lookup("nowhere at all").unwrap(), Some(Vec::new()));
    }

    #[test]
    fn prune_removes_only_aged_rows() {
        let cache = test_cache();
        let month_ago = Timestamp::now().as_second() - 40 * SECONDS_PER_DAY;
        cache.store_at("old query", &sample_places(1), month_ago).unwrap();
        cache.store("fresh query", &sample_places(1)).unwrap();

        cache.prune(30).unwrap();

        assert!(cache.lookup("old query").unwrap().is_none());
        assert!(cache.lookup("fresh query").unwrap().is_some());
    }

    #[test]
    fn cached_geocoder_skips_live_service_on_hit() {
        let geocoder = CachedGeocoder::new(CountingGeocoder::new(sample_places(2)), test_cache());

        let first = geocoder.search("Potsdamer Platz").unwrap();
        let second = geocoder.search("  potsdamer  platz ").unwrap();

        assert_eq!(first, second);
        assert_eq!(geocoder.inner.searches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cached_geocoder_caches_empty_answers() {
        let geocoder = CachedGeocoder::new(CountingGeocoder::new(Vec::new()), test_cache());

        assert!(geocoder.search("gibberish").unwrap().is_empty());
        assert!(geocoder.search("gibberish").unwrap().is_empty());
        assert_eq!(geocoder.inner.searches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn distinct_queries_each_go_live() {
        let geocoder = CachedGeocoder::new(CountingGeocoder::new(sample_places(1)), test_cache());

        geocoder.search("first").unwrap();
        geocoder.search("second").unwrap();

        assert_eq!(geocoder.inner.searches.load(Ordering::SeqCst), 2);
    }
}
