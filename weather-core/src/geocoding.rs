use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::PipelineError,
    model::{Coordinates, LocationQuery},
};

pub mod forward;

pub use forward::ForwardGeocoder;

/// Resolves a place name to coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    /// `Ok(None)` means the service knows no place by that name.
    async fn resolve(&self, query: &LocationQuery) -> Result<Option<Coordinates>, PipelineError>;
}
