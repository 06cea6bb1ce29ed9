//! HTTP transport for Horizon.
//!
//! The [`Transport`] trait is the seam between the query/stream machinery and
//! the network. [`HttpTransport`] is the reqwest-backed implementation; tests
//! and embedders can inject their own.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use futures::stream::BoxStream;
use reqwest::Url;
use serde::Deserialize;

use super::sse::{SseEvent, decode_event_stream};
use crate::error::TransportError;
use crate::types::{Cursor, Network};

/// Network configuration presets.
pub struct NetworkConfig {
    /// The Horizon URL for this network.
    pub horizon_url: &'static str,
    /// The network served.
    pub network: Network,
}

/// Public network configuration.
pub const PUBLIC: NetworkConfig = NetworkConfig {
    horizon_url: "https://horizon.stellar.org",
    network: Network::Public,
};

/// Testnet configuration.
pub const TESTNET: NetworkConfig = NetworkConfig {
    horizon_url: "https://horizon-testnet.stellar.org",
    network: Network::Testnet,
};

/// Futurenet configuration.
pub const FUTURENET: NetworkConfig = NetworkConfig {
    horizon_url: "https://horizon-futurenet.stellar.org",
    network: Network::Futurenet,
};

/// Retry configuration for requests and stream reconnects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of retries.
    pub max_retries: u32,
    /// Initial delay in milliseconds.
    pub initial_delay_ms: u64,
    /// Maximum delay in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 500,
            max_delay_ms: 5000,
        }
    }
}

impl RetryConfig {
    /// Reconnect budget for live streams.
    pub fn streaming() -> Self {
        Self {
            max_retries: 5,
            initial_delay_ms: 1000,
            max_delay_ms: 30_000,
        }
    }

    /// No retries at all.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_delay_ms: 0,
            max_delay_ms: 0,
        }
    }

    /// Delay before retry number `attempt` (zero-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        backoff_delay(self.initial_delay_ms, self.max_delay_ms, attempt)
    }
}

/// `min(initial * 2^attempt, max)`, saturating.
pub(crate) fn backoff_delay(initial_ms: u64, max_ms: u64, attempt: u32) -> Duration {
    let factor = 2u64.checked_pow(attempt).unwrap_or(u64::MAX);
    Duration::from_millis(std::cmp::min(initial_ms.saturating_mul(factor), max_ms))
}

/// Boxed future returned by [`Transport`] methods.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, TransportError>> + Send + 'a>>;

/// A live feed of server-sent events.
pub type EventStream = BoxStream<'static, Result<SseEvent, TransportError>>;

/// Fetches Horizon resources.
///
/// # Example
///
/// ```rust
/// use horizon_kit::{Cursor, EventStream, Transport, TransportError, TransportFuture, Url};
///
/// struct Offline;
///
/// impl Transport for Offline {
///     fn get(&self, url: Url) -> TransportFuture<'_, String> {
///         Box::pin(async move { Err(TransportError::disconnected(url.to_string())) })
///     }
///
///     fn stream(&self, url: Url, _last_event_id: Option<Cursor>) -> TransportFuture<'_, EventStream> {
///         Box::pin(async move { Err(TransportError::disconnected(url.to_string())) })
///     }
/// }
/// ```
pub trait Transport: Send + Sync {
    /// GET a resource and return its body.
    ///
    /// Non-2xx answers are errors; the body of a successful answer is
    /// returned verbatim for the envelope reader.
    fn get(&self, url: Url) -> TransportFuture<'_, String>;

    /// Open an event stream, resuming after `last_event_id` when given.
    fn stream(&self, url: Url, last_event_id: Option<Cursor>) -> TransportFuture<'_, EventStream>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn get(&self, url: Url) -> TransportFuture<'_, String> {
        (**self).get(url)
    }

    fn stream(&self, url: Url, last_event_id: Option<Cursor>) -> TransportFuture<'_, EventStream> {
        (**self).stream(url, last_event_id)
    }
}

/// Error body Horizon sends with non-2xx responses (`application/problem+json`).
#[derive(Debug, Default, Deserialize)]
struct Problem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

/// reqwest-backed transport with retries for single-shot requests.
pub struct HttpTransport {
    client: reqwest::Client,
    retry_config: RetryConfig,
    client_name: String,
    client_version: String,
}

impl HttpTransport {
    /// Create a transport with the default retry configuration.
    pub fn new() -> Self {
        Self::with_retry_config(RetryConfig::default())
    }

    /// Create a transport with custom retry configuration.
    pub fn with_retry_config(retry_config: RetryConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            retry_config,
            client_name: env!("CARGO_PKG_NAME").to_string(),
            client_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Identify the application in `X-Client-Name` / `X-Client-Version`.
    pub fn with_client_name(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.client_name = name.into();
        self.client_version = version.into();
        self
    }

    /// Use a preconfigured reqwest client (timeouts, proxies, TLS).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// The retry configuration.
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry_config
    }

    /// GET with retries.
    async fn get_with_retry(&self, url: Url) -> Result<String, TransportError> {
        let total_attempts = self.retry_config.max_retries + 1;

        for attempt in 0..total_attempts {
            match self.try_get(&url).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && attempt < total_attempts - 1 => {
                    let delay = self.retry_config.delay_for(attempt);
                    tracing::debug!(%url, attempt, ?delay, error = %e, "retrying request");
                    tokio::time::sleep(delay).await;
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        Err(TransportError::Timeout(total_attempts))
    }

    /// Single GET attempt.
    async fn try_get(&self, url: &Url) -> Result<String, TransportError> {
        let response = self
            .client
            .get(url.clone())
            .header("Accept", "application/hal+json, application/json")
            .header("X-Client-Name", &self.client_name)
            .header("X-Client-Version", &self.client_version)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(problem(status.as_u16(), &body));
        }
        Ok(body)
    }

    async fn open_stream(
        &self,
        url: Url,
        last_event_id: Option<Cursor>,
    ) -> Result<EventStream, TransportError> {
        let mut request = self
            .client
            .get(url)
            .header("Accept", "text/event-stream")
            .header("Cache-Control", "no-cache")
            .header("X-Client-Name", &self.client_name)
            .header("X-Client-Version", &self.client_version);
        if let Some(cursor) = &last_event_id {
            request = request.header("Last-Event-ID", cursor.as_str());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(problem(status.as_u16(), &body));
        }

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(TransportError::from));
        Ok(decode_event_stream(body))
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: Url) -> TransportFuture<'_, String> {
        Box::pin(self.get_with_retry(url))
    }

    fn stream(&self, url: Url, last_event_id: Option<Cursor>) -> TransportFuture<'_, EventStream> {
        Box::pin(self.open_stream(url, last_event_id))
    }
}

/// Build a status error from a problem+json body, falling back to the raw body.
fn problem(status: u16, body: &str) -> TransportError {
    let parsed: Problem = serde_json::from_str(body).unwrap_or_default();
    let title = parsed
        .title
        .unwrap_or_else(|| body.chars().take(200).collect());
    TransportError::status(status, title, parsed.detail)
}
