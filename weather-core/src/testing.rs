//! In-memory stand-ins for the upstream clients, used by unit tests.

use async_trait::async_trait;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use crate::{
    error::{PipelineError, Upstream},
    geocoding::Geocoder,
    model::{Coordinates, LocationQuery, RawWeatherPayload},
    provider::WeatherSource,
};

#[derive(Debug, Clone, Default)]
pub(crate) struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub(crate) fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug)]
pub(crate) struct FakeGeocoder {
    result: Result<Option<Coordinates>, String>,
    calls: CallCounter,
}

impl FakeGeocoder {
    pub(crate) fn found(coords: Coordinates) -> Self {
        Self { result: Ok(Some(coords)), calls: CallCounter::default() }
    }

    pub(crate) fn not_found() -> Self {
        Self { result: Ok(None), calls: CallCounter::default() }
    }

    pub(crate) fn failing(reason: &str) -> Self {
        Self { result: Err(reason.to_string()), calls: CallCounter::default() }
    }

    pub(crate) fn calls(&self) -> CallCounter {
        self.calls.clone()
    }
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn resolve(&self, _query: &LocationQuery) -> Result<Option<Coordinates>, PipelineError> {
        self.calls.hit();
        match &self.result {
            Ok(coords) => Ok(*coords),
            Err(reason) => Err(PipelineError::shape(Upstream::Geocoding, reason.as_str())),
        }
    }
}

#[derive(Debug)]
pub(crate) struct FakeWeather {
    result: Result<RawWeatherPayload, String>,
    calls: CallCounter,
    seen: Arc<Mutex<Vec<Coordinates>>>,
}

impl FakeWeather {
    pub(crate) fn returning(payload: RawWeatherPayload) -> Self {
        Self { result: Ok(payload), calls: CallCounter::default(), seen: Arc::default() }
    }

    pub(crate) fn failing(reason: &str) -> Self {
        Self {
            result: Err(reason.to_string()),
            calls: CallCounter::default(),
            seen: Arc::default(),
        }
    }

    pub(crate) fn calls(&self) -> CallCounter {
        self.calls.clone()
    }

    pub(crate) fn seen(&self) -> Arc<Mutex<Vec<Coordinates>>> {
        Arc::clone(&self.seen)
    }
}

#[async_trait]
impl WeatherSource for FakeWeather {
    async fn current(&self, coords: &Coordinates) -> Result<RawWeatherPayload, PipelineError> {
        self.calls.hit();
        self.seen.lock().unwrap().push(*coords);
        match &self.result {
            Ok(payload) => Ok(payload.clone()),
            Err(reason) => Err(PipelineError::shape(Upstream::Weather, reason.as_str())),
        }
    }
}

pub(crate) fn riccione_payload() -> RawWeatherPayload {
    RawWeatherPayload {
        temp: 300.0,
        feels_like: 299.0,
        pressure: 1012,
        humidity: 60,
        wind_speed: 3.0,
        wind_deg: 10.0,
        description: "clear sky".to_string(),
    }
}

/// Answer exactly one HTTP request on a local port with `status` and `body`.
/// Returns the base URL to point a client at.
pub(crate) async fn serve_once(status: &str, body: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let response = format!(
        "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    );

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut head = Vec::new();
        let mut buf = [0u8; 4096];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            head.extend_from_slice(&buf[..n]);
        }
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
    });

    format!("http://{addr}")
}
