//! Core library for the weather chat bot.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Geocoding and current-weather clients behind small traits
//! - Unit conversion and reply formatting
//! - The command router that ties them together
//!
//! It knows nothing about a particular chat platform; `weather-bot` supplies the transport.

pub mod config;
pub mod error;
pub mod geocoding;
mod http;
pub mod model;
pub mod pipeline;
pub mod provider;
pub mod router;
pub mod transform;

#[cfg(test)]
mod testing;

pub use config::{Config, Credentials, Secret};
pub use error::{CommandParseError, ConfigError, PipelineError, Upstream};
pub use geocoding::{ForwardGeocoder, Geocoder};
pub use http::build_client;
pub use model::{Coordinates, LocationQuery, RawWeatherPayload, WeatherReport};
pub use pipeline::{Resolution, WeatherPipeline, pipeline_from_config};
pub use provider::{OpenWeatherClient, WeatherSource};
pub use router::{Command, CommandRequest, Router};
pub use transform::CompassPolicy;
