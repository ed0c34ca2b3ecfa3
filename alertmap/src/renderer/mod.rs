//! Rendering endpoint collaborator.
//!
//! The composite raster store is filled from a map rendering server
//! (tileserver-gl) that exposes `GET /health` and
//! `GET /styles/{style}/{z}/{x}/{y}.{ext}`. Starting and stopping that
//! server is someone else's job; this module only describes the seam
//! ([`RendererLifecycle`]), addresses the endpoint and waits for it to
//! report ready.

use std::time::Duration;

use thiserror::Error;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::provider::{AsyncHttpClient, ProviderError, TileUrlTemplate};

/// Port used when none is configured.
pub const DEFAULT_PORT: u16 = 8080;

/// Delay between two health probes.
pub const DEFAULT_HEALTH_INTERVAL: Duration = Duration::from_secs(2);

/// Renderer host inside the docker compose network.
pub const DOCKER_HOST: &str = "tileserver-gl";

/// Renderer host everywhere else.
pub const LOCAL_HOST: &str = "localhost";

/// Errors raised while talking to the rendering endpoint.
#[derive(Debug, Error)]
pub enum RendererError {
    /// Health probe never succeeded within the configured timeout.
    #[error("Rendering endpoint {url} unavailable after {waited:?}")]
    EndpointUnavailable { url: String, waited: Duration },

    /// The caller cancelled the run while the endpoint was still starting.
    #[error("Stopped waiting for rendering endpoint {url} after {waited:?}")]
    Cancelled { url: String, waited: Duration },

    #[error("Invalid renderer configuration: {0}")]
    InvalidConfig(String),
}

/// Where the renderer lives and which style to pull.
#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    pub host: String,
    pub port: u16,
    /// Style name; also the path segment under `/styles/`
    pub style: String,
    /// Tile file extension served by the style
    pub format: String,
    pub health_interval: Duration,
    /// `None` waits forever
    pub health_timeout: Option<Duration>,
}

impl RendererConfig {
    pub fn new(style: impl Into<String>) -> Self {
        Self {
            host: LOCAL_HOST.to_string(),
            port: DEFAULT_PORT,
            style: style.into(),
            format: "jpg".to_string(),
            health_interval: DEFAULT_HEALTH_INTERVAL,
            health_timeout: None,
        }
    }

    /// Host for the given `ENVIRONMENT` value.
    pub fn host_for_environment(environment: Option<&str>) -> &'static str {
        match environment {
            Some("docker") => DOCKER_HOST,
            _ => LOCAL_HOST,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_health_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.health_timeout = timeout;
        self
    }
}

/// Addresses of a running renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererEndpoint {
    base_url: String,
    style: String,
    format: String,
}

impl RendererEndpoint {
    pub fn new(base_url: &str, style: &str, format: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            style: style.to_string(),
            format: format.to_string(),
        }
    }

    pub fn from_config(config: &RendererConfig) -> Self {
        Self::new(
            &format!("http://{}:{}", config.host, config.port),
            &config.style,
            &config.format,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn health_url(&self) -> String {
        format!("{}/health", self.base_url)
    }

    /// XYZ template of the style's raster tiles.
    pub fn tile_template(&self) -> Result<TileUrlTemplate, ProviderError> {
        TileUrlTemplate::parse(&format!(
            "{}/styles/{}/{{z}}/{{x}}/{{y}}.{}",
            self.base_url, self.style, self.format
        ))
    }

    /// Polls the health URL until it answers with success.
    ///
    /// `cancellation` is watched during every probe and every pause.
    ///
    /// # Errors
    ///
    /// [`RendererError::EndpointUnavailable`] once `timeout` has elapsed
    /// without a successful probe, [`RendererError::Cancelled`] as soon as
    /// `cancellation` fires.
    pub async fn wait_until_ready<C: AsyncHttpClient>(
        &self,
        client: &C,
        interval: Duration,
        timeout: Option<Duration>,
        cancellation: &CancellationToken,
    ) -> Result<(), RendererError> {
        let url = self.health_url();
        let started = Instant::now();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let probe = tokio::select! {
                biased;
                _ = cancellation.cancelled() => None,
                result = client.get(&url) => Some(result),
            };
            match probe {
                None => {
                    return Err(RendererError::Cancelled {
                        url,
                        waited: started.elapsed(),
                    })
                }
                Some(Ok(_)) => {
                    info!(url = %url, attempts, "Rendering endpoint is ready");
                    return Ok(());
                }
                Some(Err(e)) => {
                    debug!(url = %url, attempts, error = %e, "Rendering endpoint not ready")
                }
            }

            let waited = started.elapsed();
            if let Some(limit) = timeout {
                if waited + interval > limit {
                    return Err(RendererError::EndpointUnavailable { url, waited });
                }
            }

            let cancelled = tokio::select! {
                biased;
                _ = cancellation.cancelled() => true,
                _ = sleep(interval) => false,
            };
            if cancelled {
                return Err(RendererError::Cancelled {
                    url,
                    waited: started.elapsed(),
                });
            }
        }
    }
}

/// Lifecycle of the rendering server.
///
/// Implementations make sure no stale renderer is running before the style
/// changes, then bring one up and hand back its endpoint.
pub trait RendererLifecycle: Send + Sync {
    fn ensure_stopped(&self) -> Result<(), RendererError>;

    fn ensure_running(&self, config: &RendererConfig) -> Result<RendererEndpoint, RendererError>;
}

/// Renderer managed outside this process.
///
/// Stopping is a no-op and "running" means addressing the configured host;
/// readiness is established separately with
/// [`RendererEndpoint::wait_until_ready`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ExternalRenderer;

impl RendererLifecycle for ExternalRenderer {
    fn ensure_stopped(&self) -> Result<(), RendererError> {
        debug!("Renderer is managed externally, nothing to stop");
        Ok(())
    }

    fn ensure_running(&self, config: &RendererConfig) -> Result<RendererEndpoint, RendererError> {
        if config.style.is_empty() {
            return Err(RendererError::InvalidConfig("style name is empty".to_string()));
        }
        if config.host.is_empty() {
            return Err(RendererError::InvalidConfig("host is empty".to_string()));
        }
        Ok(RendererEndpoint::from_config(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::TileCoord;
    use crate::provider::MockAsyncHttpClient;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Health endpoint that fails a fixed number of times before succeeding.
    struct WarmingUp {
        failures_left: AtomicUsize,
        probes: AtomicUsize,
    }

    impl WarmingUp {
        fn new(failures: usize) -> Self {
            Self {
                failures_left: AtomicUsize::new(failures),
                probes: AtomicUsize::new(0),
            }
        }
    }

    impl AsyncHttpClient for WarmingUp {
        async fn get(&self, _url: &str) -> Result<Vec<u8>, ProviderError> {
            self.probes.fetch_add(1, Ordering::SeqCst);
            let left = self.failures_left.load(Ordering::SeqCst);
            if left == 0 {
                return Ok(b"OK".to_vec());
            }
            self.failures_left.store(left - 1, Ordering::SeqCst);
            Err(ProviderError::HttpError("connection refused".to_string()))
        }
    }

    #[test]
    fn test_host_for_environment() {
        assert_eq!(RendererConfig::host_for_environment(Some("docker")), "tileserver-gl");
        assert_eq!(RendererConfig::host_for_environment(Some("local")), "localhost");
        assert_eq!(RendererConfig::host_for_environment(None), "localhost");
    }

    #[test]
    fn test_endpoint_urls() {
        let config = RendererConfig::new("alert-42").with_port(9090);
        let endpoint = ExternalRenderer.ensure_running(&config).unwrap();

        assert_eq!(endpoint.base_url(), "http://localhost:9090");
        assert_eq!(endpoint.health_url(), "http://localhost:9090/health");
        let template = endpoint.tile_template().unwrap();
        assert_eq!(
            template.url_for(&TileCoord::new(5, 10, 12)),
            "http://localhost:9090/styles/alert-42/5/10/12.jpg"
        );
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let endpoint = RendererEndpoint::new("http://render:8080/", "s", "png");
        assert_eq!(endpoint.health_url(), "http://render:8080/health");
    }

    #[test]
    fn test_external_renderer_rejects_empty_style() {
        let config = RendererConfig::new("");
        assert!(matches!(
            ExternalRenderer.ensure_running(&config),
            Err(RendererError::InvalidConfig(_))
        ));
        assert!(ExternalRenderer.ensure_stopped().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_ready_polls_until_healthy() {
        let endpoint = RendererEndpoint::new("http://localhost:8080", "s", "jpg");
        let client = WarmingUp::new(3);

        endpoint
            .wait_until_ready(&client, DEFAULT_HEALTH_INTERVAL, None, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(client.probes.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_ready_times_out() {
        let endpoint = RendererEndpoint::new("http://localhost:8080", "s", "jpg");
        let client = MockAsyncHttpClient::new(Err(ProviderError::HttpError(
            "connection refused".to_string(),
        )));

        let result = endpoint
            .wait_until_ready(
                &client,
                Duration::from_secs(2),
                Some(Duration::from_secs(7)),
                &CancellationToken::new(),
            )
            .await;

        match result {
            Err(RendererError::EndpointUnavailable { url, waited }) => {
                assert_eq!(url, "http://localhost:8080/health");
                assert!(waited <= Duration::from_secs(7));
            }
            other => panic!("expected EndpointUnavailable, got {:?}", other),
        }
        // Probes at t = 0, 2, 4 and 6 seconds
        assert_eq!(client.call_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_token_stops_an_unbounded_wait() {
        let endpoint = RendererEndpoint::new("http://localhost:8080", "s", "jpg");
        let client = MockAsyncHttpClient::new(Err(ProviderError::HttpError(
            "connection refused".to_string(),
        )));
        let token = CancellationToken::new();
        token.cancel();

        let result = tokio::time::timeout(
            Duration::from_secs(3600),
            endpoint.wait_until_ready(&client, DEFAULT_HEALTH_INTERVAL, None, &token),
        )
        .await
        .expect("wait ignored the cancelled token");

        assert!(matches!(result, Err(RendererError::Cancelled { .. })));
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_pause_ends_the_wait() {
        let endpoint = RendererEndpoint::new("http://localhost:8080", "s", "jpg");
        let client = MockAsyncHttpClient::new(Err(ProviderError::HttpError(
            "connection refused".to_string(),
        )));
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            sleep(Duration::from_secs(5)).await;
            canceller.cancel();
        });

        let result = endpoint
            .wait_until_ready(&client, Duration::from_secs(2), None, &token)
            .await;

        match result {
            Err(RendererError::Cancelled { waited, .. }) => {
                assert!(waited >= Duration::from_secs(5) && waited < Duration::from_secs(6));
            }
            other => panic!("expected Cancelled, got {:?}", other),
        }
        // Probes at t = 0, 2 and 4 seconds
        assert_eq!(client.call_count(), 3);
    }
}
