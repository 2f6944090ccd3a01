use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::PipelineError,
    model::{Coordinates, RawWeatherPayload},
};

pub mod openweather;

pub use openweather::OpenWeatherClient;

/// Source of current conditions for a coordinate pair.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    async fn current(&self, coords: &Coordinates) -> Result<RawWeatherPayload, PipelineError>;
}
