use reqwest::Client;
use tracing::debug;

use crate::{
    config::{Config, Credentials},
    error::PipelineError,
    geocoding::{ForwardGeocoder, Geocoder},
    model::{LocationQuery, WeatherReport},
    provider::{OpenWeatherClient, WeatherSource},
    transform::CompassPolicy,
};

/// Outcome of a lookup that reached both upstreams without failing.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Report(WeatherReport),
    NotFound(LocationQuery),
}

/// geocode -> fetch current conditions -> transform.
#[derive(Debug)]
pub struct WeatherPipeline {
    geocoder: Box<dyn Geocoder>,
    weather: Box<dyn WeatherSource>,
    compass: CompassPolicy,
}

impl WeatherPipeline {
    pub fn new(
        geocoder: Box<dyn Geocoder>,
        weather: Box<dyn WeatherSource>,
        compass: CompassPolicy,
    ) -> Self {
        Self { geocoder, weather, compass }
    }

    pub async fn resolve(&self, query: &LocationQuery) -> Result<Resolution, PipelineError> {
        let Some(coords) = self.geocoder.resolve(query).await? else {
            debug!(query = %query, "location not found");
            return Ok(Resolution::NotFound(query.clone()));
        };

        let payload = self.weather.current(&coords).await?;

        Ok(Resolution::Report(WeatherReport::from_payload(payload, query, self.compass)))
    }
}

/// Build the HTTP-backed pipeline on a shared client. Endpoint overrides and
/// the compass policy come from `config`.
pub fn pipeline_from_config(
    config: &Config,
    credentials: &Credentials,
    http: Client,
) -> WeatherPipeline {
    let mut geocoder = ForwardGeocoder::new(credentials, http.clone());
    if let Some(url) = &config.endpoints.geocoding_url {
        geocoder = geocoder.with_base_url(url.as_str());
    }

    let mut weather = OpenWeatherClient::new(credentials, http);
    if let Some(url) = &config.endpoints.weather_url {
        weather = weather.with_base_url(url.as_str());
    }

    WeatherPipeline::new(Box::new(geocoder), Box::new(weather), config.wind_compass)
}
