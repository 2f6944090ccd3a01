use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use std::fmt;
use serde::Deserialize;
use tracing::debug;

use crate::{
    config::Credentials,
    error::{PipelineError, Upstream},
    http::fetch_body,
    model::{Coordinates, RawWeatherPayload},
};

use super::WeatherSource;

pub const DEFAULT_WEATHER_URL: &str = "https://api.openweathermap.org";

/// OpenWeather One Call client. Values come back in Kelvin and m/s.
#[derive(Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl fmt::Debug for OpenWeatherClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenWeatherClient").field("base_url", &self.base_url).finish_non_exhaustive()
    }
}

impl OpenWeatherClient {
    pub fn new(credentials: &Credentials, http: Client) -> Self {
        Self {
            api_key: credentials.weather_api_key().to_owned(),
            base_url: DEFAULT_WEATHER_URL.to_string(),
            http,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request(&self, coords: &Coordinates) -> RequestBuilder {
        let url = format!("{}/data/2.5/onecall", self.base_url.trim_end_matches('/'));

        self.http.get(url).query(&[
            ("lat", coords.latitude().to_string().as_str()),
            ("lon", coords.longitude().to_string().as_str()),
            ("exclude", "minutely,hourly,daily,alerts"),
            ("appid", self.api_key.as_str()),
        ])
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    async fn current(&self, coords: &Coordinates) -> Result<RawWeatherPayload, PipelineError> {
        debug!(lat = coords.latitude(), lon = coords.longitude(), "fetching current weather");

        let body = fetch_body(Upstream::Weather, self.request(coords)).await?;
        parse_current(&body)
    }
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrent {
    temp: f64,
    feels_like: f64,
    pressure: i64,
    humidity: i64,
    wind_speed: f64,
    wind_deg: f64,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwOneCallResponse {
    current: Option<OwCurrent>,
}

fn parse_current(body: &str) -> Result<RawWeatherPayload, PipelineError> {
    let parsed: OwOneCallResponse = serde_json::from_str(body)
        .map_err(|e| PipelineError::shape(Upstream::Weather, e.to_string()))?;

    let current = parsed
        .current
        .ok_or_else(|| PipelineError::shape(Upstream::Weather, "missing `current`"))?;

    let description = current
        .weather
        .into_iter()
        .next()
        .map(|w| w.description)
        .ok_or_else(|| PipelineError::shape(Upstream::Weather, "empty `current.weather`"))?;

    Ok(RawWeatherPayload {
        temp: current.temp,
        feels_like: current.feels_like,
        pressure: current.pressure,
        humidity: current.humidity,
        wind_speed: current.wind_speed,
        wind_deg: current.wind_deg,
        description,
    })
}
