use std::time::Duration;

use reqwest::{Client, RequestBuilder};

use crate::error::{ConfigError, PipelineError, Upstream, truncate_body};

/// Shared client for both upstreams. The timeout lives here, not in the pipeline.
pub fn build_client(timeout: Duration) -> Result<Client, ConfigError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("weather-bot/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(ConfigError::HttpClient)
}

// the URL may carry an API key in its query string
fn transport(upstream: Upstream, source: reqwest::Error) -> PipelineError {
    PipelineError::Transport { upstream, source: source.without_url() }
}

/// Send `request` and return the body of a 2xx response.
pub(crate) async fn fetch_body(
    upstream: Upstream,
    request: RequestBuilder,
) -> Result<String, PipelineError> {
    let res = request
        .send()
        .await
        .map_err(|source| transport(upstream, source))?;

    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|source| transport(upstream, source))?;

    if !status.is_success() {
        return Err(PipelineError::Status { upstream, status, body: truncate_body(&body) });
    }

    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::serve_once;

    #[tokio::test]
    async fn non_success_status_keeps_truncated_body() {
        let base = serve_once("500 Internal Server Error", &"x".repeat(500)).await;
        let request = Client::new().get(format!("{base}/anything"));

        let err = fetch_body(Upstream::Weather, request).await.unwrap_err();
        let PipelineError::Status { upstream, status, body } = err else {
            panic!("expected a status error, got {err:?}");
        };
        assert_eq!(upstream, Upstream::Weather);
        assert_eq!(status, reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.len(), 203);
        assert!(body.ends_with("..."));
    }

    #[tokio::test]
    async fn success_returns_body() {
        let base = serve_once("200 OK", "[]").await;
        let request = Client::new().get(format!("{base}/ok"));

        assert_eq!(fetch_body(Upstream::Geocoding, request).await.unwrap(), "[]");
    }

    #[tokio::test]
    async fn transport_error_hides_query_string() {
        let request =
            Client::new().get("http://127.0.0.1:9/x").query(&[("appid", "SUPERSECRETKEY")]);

        let err = fetch_body(Upstream::Weather, request).await.unwrap_err();
        assert!(matches!(err, PipelineError::Transport { .. }));
        assert!(!err.to_string().contains("SUPERSECRETKEY"));
        assert!(!format!("{err:?}").contains("SUPERSECRETKEY"));
    }
}
