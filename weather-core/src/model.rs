use std::fmt;

use serde::{Deserialize, Serialize};

/// A user-supplied location name, trimmed and guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationQuery(String);

impl LocationQuery {
    /// Returns `None` for empty or whitespace-only input.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Both components must be finite.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        (latitude.is_finite() && longitude.is_finite()).then_some(Self { latitude, longitude })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Current conditions as reported upstream: Kelvin, hPa, %, m/s, degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawWeatherPayload {
    pub temp: f64,
    pub feels_like: f64,
    pub pressure: i64,
    pub humidity: i64,
    pub wind_speed: f64,
    pub wind_deg: f64,
    pub description: String,
}

/// Display-ready weather, built by `WeatherReport::from_payload` in [`crate::transform`].
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub location: String,
    pub temperature_c: String,
    pub feels_like_c: String,
    pub pressure_hpa: i64,
    pub humidity_pct: i64,
    pub wind_speed_mps: String,
    pub wind_speed_kn: String,
    pub wind_direction: &'static str,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_query_rejects_blank_input() {
        assert!(LocationQuery::parse("").is_none());
        assert!(LocationQuery::parse("   \t\n").is_none());
    }

    #[test]
    fn location_query_trims_but_keeps_inner_whitespace() {
        let q = LocationQuery::parse("  New   York ").unwrap();
        assert_eq!(q.as_str(), "New   York");
    }

    #[test]
    fn coordinates_must_be_finite() {
        assert!(Coordinates::new(f64::NAN, 1.0).is_none());
        assert!(Coordinates::new(1.0, f64::INFINITY).is_none());

        let c = Coordinates::new(44.0, 12.65).unwrap();
        assert_eq!(c.latitude(), 44.0);
        assert_eq!(c.longitude(), 12.65);
    }
}
