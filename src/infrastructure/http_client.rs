//! HTTP client for the catalog and favorites backends
//!
//! Thin wrapper over `reqwest` with timeout and user agent management. Every
//! failure is mapped into a [`SyncError`] here so the sync layer never sees a
//! transport type. There is deliberately no retry: a failed request fails the
//! operation that issued it.

use anyhow::{Result, anyhow};
use reqwest::{Client, ClientBuilder, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info};
use url::Url;

use crate::domain::errors::{SyncError, SyncResult};
use crate::infrastructure::config::{AdvancedConfig, defaults};

/// Configuration for HTTP client behavior
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
    /// Whether to follow redirects
    pub follow_redirects: bool,
}

impl HttpClientConfig {
    /// Create HttpClientConfig from the advanced configuration tier
    pub fn from_advanced_config(advanced: &AdvancedConfig) -> Self {
        Self {
            timeout_seconds: advanced.request_timeout_seconds,
            user_agent: advanced.user_agent.clone(),
            follow_redirects: true,
        }
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            user_agent: defaults::USER_AGENT.to_string(),
            follow_redirects: true,
        }
    }
}

/// JSON-over-HTTP client shared by both remotes
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    /// Optional context label for provenance in logs (e.g., "catalog", "favorites")
    context_label: Option<String>,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .gzip(true)
            .brotli(true)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            config,
            context_label: None,
        })
    }

    /// Set a human-readable context label for logging provenance (returns self for chaining)
    pub fn with_context_label(mut self, label: &str) -> Self {
        self.context_label = Some(label.to_string());
        self
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    fn label(&self) -> &str {
        self.context_label.as_deref().unwrap_or("http")
    }

    /// Send a request and reject any non-2xx status
    async fn send(&self, request: RequestBuilder, method: &str, url: &Url) -> SyncResult<Response> {
        debug!("🌐 [{}] HTTP {} {}", self.label(), method, url);
        let response = request.send().await.map_err(|e| {
            error!("❌ [{}] HTTP {} failed: {} ({})", self.label(), method, url, e);
            SyncError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            error!("❌ [{}] HTTP error {}: {} {}", self.label(), status, method, url);
            return Err(status_error(status, method, url));
        }

        Ok(response)
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> SyncResult<T> {
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// GET and decode a typed JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> SyncResult<T> {
        let response = self.send(self.client.get(url.clone()), "GET", url).await?;
        Self::read_json(response).await
    }

    /// GET an untyped JSON body (shape classification happens downstream)
    pub async fn get_value(&self, url: &Url) -> SyncResult<Value> {
        self.get_json(url).await
    }

    /// POST a JSON body; any 2xx counts as confirmation and the body is ignored
    pub async fn post_json<B: Serialize + ?Sized>(&self, url: &Url, body: &B) -> SyncResult<()> {
        let request = self.client.post(url.clone()).json(body);
        self.send(request, "POST", url).await?;
        info!("✅ [{}] POST confirmed: {}", self.label(), url);
        Ok(())
    }

    /// DELETE and decode the typed JSON body of the response
    pub async fn delete_json<T: DeserializeOwned>(&self, url: &Url) -> SyncResult<T> {
        let response = self.send(self.client.delete(url.clone()), "DELETE", url).await?;
        Self::read_json(response).await
    }
}

/// Maps a non-success status onto the error taxonomy: 404 is `NotFound`, the rest `Network`
pub fn status_error(status: StatusCode, method: &str, url: &Url) -> SyncError {
    if status == StatusCode::NOT_FOUND {
        SyncError::NotFound(format!("{} {}", method, url))
    } else {
        SyncError::Network(format!("HTTP {} for {} {}", status, method, url))
    }
}
