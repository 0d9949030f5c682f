//! Client for Nominatim-compatible geocoding services.
//!
//! Speaks the public `/search` and `/reverse` endpoints with
//! `format=jsonv2`, where latitude and longitude arrive as decimal
//! strings. A failed reverse lookup is reported in the response body, not
//! the status code.

use serde::Deserialize;

use crate::model::{Coordinates, Place};

use super::{GeoError, Geocoder, REQUEST_TIMEOUT, USER_AGENT};

/// A single `/search` result row. Only the fields we keep.
#[derive(Debug, Deserialize)]
struct SearchRow {
    lat: String,
    lon: String,
    display_name: String,
}

impl SearchRow {
    fn into_place(self) -> Result<Place, GeoError> {
        Ok(Place {
            address: self.display_name,
            coordinates: Coordinates {
                latitude: parse_coordinate(&self.lat)?,
                longitude: parse_coordinate(&self.lon)?,
            },
        })
    }
}

/// A `/reverse` response: a place, or an error body for positions the
/// service cannot map (open ocean, poles).
#[derive(Debug, Deserialize)]
struct ReverseResponse {
    error: Option<serde_json::Value>,
    lat: Option<String>,
    lon: Option<String>,
    display_name: Option<String>,
}

impl ReverseResponse {
    fn into_place(self) -> Result<Option<Place>, GeoError> {
        if self.error.is_some() {
            return Ok(None);
        }
        let (Some(lat), Some(lon), Some(display_name)) = (self.lat, self.lon, self.display_name)
        else {
            return Err(GeoError::Malformed(
                "reverse response missing coordinate fields".to_string(),
            ));
        };
        Ok(Some(Place {
            address: display_name,
            coordinates: Coordinates {
                latitude: parse_coordinate(&lat)?,
                longitude: parse_coordinate(&lon)?,
            },
        }))
    }
}

fn parse_coordinate(raw: &str) -> Result<f64, GeoError> {
    raw.parse()
        .map_err(|_| GeoError::Malformed(format!("bad coordinate {raw:?}")))
}

/// Live client for one geocoder endpoint.
pub struct NominatimClient {
    agent: ureq::Agent,
    base_url: String,
    limit: u8,
}

impl NominatimClient {
    /// `base_url` is the service root, e.g. `https://nominatim.openstreetmap.org`.
    /// `limit` caps how many candidates a search asks for.
    pub fn new(base_url: impl Into<String>, limit: u8) -> Self {
        Self {
            agent: ureq::agent(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            limit,
        }
    }
}

impl Geocoder for NominatimClient {
    fn search(&self, query: &str) -> Result<Vec<Place>, GeoError> {
        let response = self
            .agent
            .get(&format!("{}/search", self.base_url))
            .set("User-Agent", USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .query("q", query)
            .query("format", "jsonv2")
            .query("limit", &self.limit.to_string())
            .call()?;
        let rows: Vec<SearchRow> = response
            .into_json()
            .map_err(|e| GeoError::Malformed(e.to_string()))?;
        rows.into_iter().map(SearchRow::into_place).collect()
    }

    fn reverse(&self, coordinates: Coordinates) -> Result<Option<Place>, GeoError> {
        let response = self
            .agent
            .get(&format!("{}/reverse", self.base_url))
            .set("User-Agent", USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .query("lat", &coordinates.latitude.to_string())
            .query("lon", &coordinates.longitude.to_string())
            .query("format", "jsonv2")
            .call()?;
        let body: ReverseResponse = response
            .into_json()
            .map_err(|e| GeoError::Malformed(e.to_string()))?;
        body.into_place()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_rows_parse_and_convert() {
        let json = r#"[
            {
                "place_id": 128497,
                "lat": "52.5170365",
                "lon": "13.3888599",
                "display_name": "Berlin, Deutschland",
                "importance": 0.89
            },
            {
                "place_id": 331291,
                "lat": "44.4096",
                "lon": "-71.1854",
                "display_name": "Berlin, Coos County, New Hampshire, United States",
                "importance": 0.51
            }
        ]"#;

        let rows: Vec<SearchRow> = serde_json::from_str(json).unwrap();
        let places: Vec<Place> = rows
            .into_iter()
            .map(|r| r.into_place().unwrap())
            .collect();

        assert_eq!(places.len(), 2);
        assert_eq!(places[0].address, "Berlin, Deutschland");
        assert!((places[0].coordinates.latitude - 52.517_036_5).abs() < 1e-9);
        assert!((places[1].coordinates.longitude - (-71.1854)).abs() < 1e-9);
    }

    #[test]
    fn unparseable_coordinate_is_malformed() {
        let row = SearchRow {
            lat: "not a number".to_string(),
            lon: "13.4".to_string(),
            display_name: "somewhere".to_string(),
        };

        assert!(matches!(row.into_place(), Err(GeoError::Malformed(_))));
    }

    #[test]
    fn reverse_error_body_means_no_address() {
        let body: ReverseResponse =
            serde_json::from_str(r#"{"error": "Unable to geocode"}"#).unwrap();
        assert_eq!(body.into_place().unwrap(), None);

        // Newer service versions report errors as an object instead.
        let body: ReverseResponse =
            serde_json::from_str(r#"{"error": {"code": 400, "message": "bad request"}}"#).unwrap();
        assert_eq!(body.into_place().unwrap(), None);
    }

    #[test]
    fn reverse_success_body_converts() {
        let json = r#"{
            "place_id": 8123,
            "lat": "48.8583701",
            "lon": "2.2944813",
            "display_name": "Tour Eiffel, Avenue Gustave Eiffel, Paris, France"
        }"#;

        let body: ReverseResponse = serde_json::from_str(json).unwrap();
        let place = body.into_place().unwrap().unwrap();
        assert!(place.address.starts_with("Tour Eiffel"));
        assert!((place.coordinates.longitude - 2.294_481_3).abs() < 1e-9);
    }

    #[test]
    fn reverse_body_without_fields_is_malformed() {
        let body: ReverseResponse = serde_json::from_str(r"{}").unwrap();
        assert!(matches!(body.into_place(), Err(GeoError::Malformed(_))));
    }
}
