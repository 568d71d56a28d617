//! Responses returned to callers and persisted as snapshots.

use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use swcache_core::{CachedResponse, Error};
use url::Url;

use crate::request::Request;

/// Visibility class of a response, following browser fetch semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    /// Same-origin response.
    Basic,
    /// Cross-origin response the client may read.
    Cors,
    /// Cross-origin `no-cors` response; status and body are not inspectable.
    Opaque,
}

/// A complete response: status, headers and the whole body.
///
/// The body is a reference-counted buffer, so the copy written to the store
/// and the copy handed to the caller never compete for a single read.
#[derive(Debug, Clone)]
pub struct Response {
    pub url: Url,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub kind: ResponseKind,
}

impl Response {
    /// Successful status and not an opaque placeholder.
    pub fn is_storable(&self) -> bool {
        self.status.is_success() && self.kind != ResponseKind::Opaque
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    /// Snapshot this response under `request`'s identity.
    pub fn to_cached(&self, request: &Request) -> CachedResponse {
        let headers = self
            .headers
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();

        CachedResponse {
            key: request.cache_key(),
            method: request.method.as_str().to_string(),
            url: request.url.to_string(),
            status: self.status.as_u16(),
            headers,
            body: self.body.to_vec(),
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Rebuild a response from a stored snapshot.
    pub fn from_cached(entry: CachedResponse) -> Result<Self, Error> {
        let url = Url::parse(&entry.url).map_err(|e| Error::Store(format!("corrupt url {}: {e}", entry.url)))?;
        let status = StatusCode::from_u16(entry.status)
            .map_err(|e| Error::Store(format!("corrupt status for {url}: {e}")))?;

        let mut headers = HeaderMap::new();
        for (name, value) in &entry.headers {
            if let (Ok(name), Ok(value)) = (HeaderName::try_from(name.as_str()), HeaderValue::from_str(value)) {
                headers.append(name, value);
            }
        }

        Ok(Self { url, status, headers, body: Bytes::from(entry.body), kind: ResponseKind::Basic })
    }
}
