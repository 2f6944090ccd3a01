use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use std::fmt;
use serde::Deserialize;
use tracing::debug;

use crate::{
    config::Credentials,
    error::{PipelineError, Upstream},
    http::fetch_body,
    model::{Coordinates, LocationQuery},
};

use super::Geocoder;

pub const DEFAULT_GEOCODING_URL: &str = "https://forward-reverse-geocoding.p.rapidapi.com";
const RAPIDAPI_HOST: &str = "forward-reverse-geocoding.p.rapidapi.com";

/// Forward geocoding through the RapidAPI Nominatim front-end.
#[derive(Clone)]
pub struct ForwardGeocoder {
    api_key: String,
    base_url: String,
    http: Client,
}

impl fmt::Debug for ForwardGeocoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForwardGeocoder").field("base_url", &self.base_url).finish_non_exhaustive()
    }
}

impl ForwardGeocoder {
    pub fn new(credentials: &Credentials, http: Client) -> Self {
        Self {
            api_key: credentials.geocoding_api_key().to_owned(),
            base_url: DEFAULT_GEOCODING_URL.to_string(),
            http,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request(&self, query: &LocationQuery) -> RequestBuilder {
        let url = format!("{}/v1/forward", self.base_url.trim_end_matches('/'));

        self.http
            .get(url)
            .query(&[
                ("query", query.as_str()),
                ("accept-language", "en"),
                ("polygon_threshold", "0.0"),
            ])
            .header("X-RapidAPI-Key", self.api_key.as_str())
            .header("X-RapidAPI-Host", RAPIDAPI_HOST)
    }
}

#[async_trait]
impl Geocoder for ForwardGeocoder {
    async fn resolve(&self, query: &LocationQuery) -> Result<Option<Coordinates>, PipelineError> {
        let body = fetch_body(Upstream::Geocoding, self.request(query)).await?;
        let coords = first_candidate(&body)?;

        debug!(query = %query, found = coords.is_some(), "geocoding finished");
        Ok(coords)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Degrees {
    Text(String),
    Number(f64),
}

impl Degrees {
    fn value(&self) -> Option<f64> {
        match self {
            Degrees::Text(s) => s.trim().parse().ok(),
            Degrees::Number(n) => Some(*n),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    lat: Degrees,
    lon: Degrees,
}

/// Coordinates of the first candidate; the rest of the list is never decoded.
fn first_candidate(body: &str) -> Result<Option<Coordinates>, PipelineError> {
    let candidates: Vec<serde_json::Value> = serde_json::from_str(body).map_err(|e| {
        PipelineError::shape(Upstream::Geocoding, format!("expected a list of candidates: {e}"))
    })?;

    let Some(first) = candidates.into_iter().next() else {
        return Ok(None);
    };

    let candidate: Candidate = serde_json::from_value(first).map_err(|e| {
        PipelineError::shape(Upstream::Geocoding, format!("malformed candidate: {e}"))
    })?;

    let lat = candidate.lat.value();
    let lon = candidate.lon.value();

    lat.zip(lon)
        .and_then(|(lat, lon)| Coordinates::new(lat, lon))
        .map(Some)
        .ok_or_else(|| {
            PipelineError::shape(Upstream::Geocoding, "candidate coordinates are not numbers")
        })
}
