//! Network side of the engine.
//!
//! ### Network trait
//! - Strategies and the lifecycle manager only see [`Network`], so the
//!   transport can be swapped (tests script it).
//!
//! ### Fetch semantics
//! - Redirects are followed transparently (max 5); the final response is
//!   what callers and the store see.
//! - Any HTTP status resolves successfully. Only transport failures
//!   (connect, timeout, body read) and oversized bodies are errors.
//! - Cross-origin `no-cors` requests yield an opaque response with an
//!   empty body.
//! - Max body bytes: 5MB (configurable)

pub mod url;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, header};
use std::time::{Duration, Instant};
use swcache_core::{AppConfig, Error};

pub use self::url::{UrlError, canonicalize, is_network_scheme, same_origin};

use crate::request::{Request, RequestMode};
use crate::response::{Response, ResponseKind};

/// Anything that can turn a request into a response over the network.
#[async_trait]
pub trait Network: Send + Sync {
    /// Perform the request. Non-2xx statuses are responses, not errors.
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "swcache/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,

    /// Application origin; responses from elsewhere are cross-origin.
    pub origin: Option<::url::Url>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "swcache/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
            origin: None,
        }
    }
}

impl FetchConfig {
    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        let origin = ::url::Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(format!("origin: {e}")))?;
        Ok(Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            origin: Some(origin),
            ..Default::default()
        })
    }
}

/// HTTP fetch client backed by reqwest.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn kind_for(&self, request: &Request, final_url: &::url::Url) -> ResponseKind {
        match &self.config.origin {
            Some(origin) if same_origin(origin, final_url) => ResponseKind::Basic,
            _ if request.mode == RequestMode::NoCors => ResponseKind::Opaque,
            _ => ResponseKind::Cors,
        }
    }

    fn check_size(&self, len: usize) -> Result<(), Error> {
        if len > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }
        Ok(())
    }
}

#[async_trait]
impl Network for FetchClient {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let start = Instant::now();

        let response = self
            .http
            .request(request.method.clone(), request.url.as_str())
            .headers(request.headers.clone())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Network(format!("timed out fetching {}", request.url))
                } else {
                    Error::Network(format!("network error: {}", e))
                }
            })?;

        let status = response.status();
        if let Some(len) = response.content_length() {
            self.check_size(len as usize)?;
        }

        let final_url = response.url().clone();
        let headers: header::HeaderMap = response.headers().clone();
        let kind = self.kind_for(request, &final_url);

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("failed to read response: {}", e)))?;
        self.check_size(body.len())?;

        let body = if kind == ResponseKind::Opaque { Bytes::new() } else { body };

        tracing::debug!(
            "fetched {} -> {} ({}) in {}ms ({} bytes)",
            request.url,
            final_url,
            status.as_u16(),
            start.elapsed().as_millis(),
            body.len()
        );

        Ok(Response { url: final_url, status, headers, body, kind })
    }
}
