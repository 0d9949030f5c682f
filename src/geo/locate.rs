//! Current-position fix from an IP-geolocation service.
//!
//! Coarse (city-level at best) but needs no GPS hardware and no API key,
//! which is all the start-field prefill asks for.

use serde::Deserialize;

use crate::model::Coordinates;

use super::{GeoError, Locator, REQUEST_TIMEOUT, USER_AGENT};

/// Response body of an ipapi.co-style JSON endpoint. The body carries many
/// more fields; only the coordinates matter here.
#[derive(Debug, Deserialize)]
struct FixResponse {
    latitude: f64,
    longitude: f64,
}

/// Locator backed by an IP-geolocation HTTP endpoint.
pub struct IpLocator {
    agent: ureq::Agent,
    url: String,
}

impl IpLocator {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            agent: ureq::agent(),
            url: url.into(),
        }
    }
}

impl Locator for IpLocator {
    fn locate(&self) -> Result<Coordinates, GeoError> {
        let response = self
            .agent
            .get(&self.url)
            .set("User-Agent", USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .call()?;
        let fix: FixResponse = response
            .into_json()
            .map_err(|e| GeoError::Malformed(e.to_string()))?;
        Ok(Coordinates {
            latitude: fix.latitude,
            longitude: fix.longitude,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fix_response_parses_amid_extra_fields() {
        let json = r#"{
            "ip": "203.0.113.9",
            "city": "Berlin",
            "region": "Berlin",
            "country_name": "Germany",
            "latitude": 52.5244,
            "longitude": 13.4105,
            "timezone": "Europe/Berlin",
            "org": "EXAMPLE-NET"
        }"#;

        let fix: FixResponse = serde_json::from_str(json).unwrap();
        assert!((fix.latitude - 52.5244).abs() < 1e-9);
        assert!((fix.longitude - 13.4105).abs() < 1e-9);
    }

    #[test]
    fn fix_response_without_coordinates_is_an_error() {
        let result: Result<FixResponse, _> =
            serde_json::from_str(r#"{"ip": "203.0.113.9", "error": true}"#);
        assert!(result.is_err());
    }
}
