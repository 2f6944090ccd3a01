//! Turns raw upstream values into the units and text shown to chat users.

use serde::{Deserialize, Serialize};

use crate::model::{LocationQuery, RawWeatherPayload, WeatherReport};

const KELVIN_OFFSET: f64 = 273.15;
const KNOTS_PER_MPS: f64 = 1.94384;
const SECTOR_DEGREES: f64 = 22.5;

const ROSE: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

const LEGACY_ROSE: [&str; 17] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW", "N",
];

/// How a wind bearing is mapped onto a compass label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompassPolicy {
    /// Sector `floor(d / 22.5)` of the 16-point rose, wrapping at 360°.
    #[default]
    Sixteen,
    /// Sector index shifted by one into a 17-entry table that starts and ends with `N`.
    Legacy,
}

pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    kelvin - KELVIN_OFFSET
}

pub fn mps_to_knots(mps: f64) -> f64 {
    mps * KNOTS_PER_MPS
}

pub fn compass_label(degrees: f64, policy: CompassPolicy) -> &'static str {
    // rem_euclid may round tiny negatives up to exactly 360.0
    let sector = ((degrees.rem_euclid(360.0) / SECTOR_DEGREES).floor() as usize) % ROSE.len();

    match policy {
        CompassPolicy::Sixteen => ROSE[sector],
        CompassPolicy::Legacy => LEGACY_ROSE[sector + 1],
    }
}

/// Plain decimal form of an upstream value, keeping at least one fractional digit.
pub fn format_reported(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains('.') {
        format!("{text}.0")
    } else {
        text
    }
}

/// Escape text for Telegram's HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

impl WeatherReport {
    pub fn from_payload(
        payload: RawWeatherPayload,
        location: &LocationQuery,
        policy: CompassPolicy,
    ) -> Self {
        Self {
            location: location.as_str().to_string(),
            temperature_c: format!("{:.2}", kelvin_to_celsius(payload.temp)),
            feels_like_c: format!("{:.2}", kelvin_to_celsius(payload.feels_like)),
            pressure_hpa: payload.pressure,
            humidity_pct: payload.humidity,
            wind_speed_mps: format_reported(payload.wind_speed),
            wind_speed_kn: format!("{:.2}", mps_to_knots(payload.wind_speed)),
            wind_direction: compass_label(payload.wind_deg, policy),
            description: payload.description,
        }
    }
}

pub fn render_report(report: &WeatherReport) -> String {
    format!(
        "Current weather in <b>{location}</b>\n\
         Temperature: {temp}°C (feels like {feels}°C)\n\
         Pressure: {pressure} hPa\n\
         Humidity: {humidity}%\n\
         Wind: {mps} m/s ({kn} kn) from {direction}\n\
         Description: {description}",
        location = escape_html(&report.location),
        temp = report.temperature_c,
        feels = report.feels_like_c,
        pressure = report.pressure_hpa,
        humidity = report.humidity_pct,
        mps = report.wind_speed_mps,
        kn = report.wind_speed_kn,
        direction = report.wind_direction,
        description = escape_html(&report.description),
    )
}

pub fn render_not_found(query: &LocationQuery) -> String {
    format!("I'm sorry but \"{}\" does not exist. Try again.", escape_html(query.as_str()))
}
