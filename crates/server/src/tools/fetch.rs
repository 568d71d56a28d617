//! sw_fetch tool implementation.
//!
//! Issues one request through the engine, exactly as an intercepted
//! application request would be handled.

use chrono::Utc;
use reqwest::Method;
use reqwest::header::{ACCEPT, HeaderValue};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use swcache_client::{Engine, Request, RequestMode, ResponseKind, ResponseSource, Route};
use swcache_client::fetch::canonicalize;
use swcache_core::Error;

use super::{header_map, json_result};

const NAVIGATE_ACCEPT: &str = "text/html,application/xhtml+xml,*/*;q=0.8";

/// Input parameters for the sw_fetch tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute URL, or a path resolved against the application origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default)]
    pub method: Option<String>,

    /// Treat as a top-level document navigation.
    #[serde(default)]
    pub navigate: bool,

    /// Optional Accept header.
    #[serde(default)]
    pub accept: Option<String>,

    /// Issue as a `no-cors` request; cross-origin responses become opaque.
    #[serde(default)]
    pub no_cors: bool,
}

/// Output structure for the sw_fetch tool.
#[derive(Debug, Clone, Serialize)]
pub struct SwFetchOutput {
    /// The request URL after resolution.
    pub url: String,
    /// The response URL, after redirects.
    pub final_url: String,
    pub status: u16,
    pub kind: ResponseKind,
    pub content_type: Option<String>,
    pub headers: BTreeMap<String, String>,
    /// Body decoded as UTF-8, lossily.
    pub body: String,
    pub route: Route,
    pub source: ResponseSource,
    pub served_at: String,
}

impl SwFetchParams {
    /// Build the engine request these parameters describe.
    pub fn to_request(&self, origin: &url::Url) -> Result<Request, McpError> {
        let url = canonicalize(&self.url, origin).map_err(|e| Error::InvalidUrl(format!("{}: {e}", self.url)))?;

        let method = match self.method.as_deref() {
            None => Method::GET,
            Some(m) => Method::from_bytes(m.trim().to_ascii_uppercase().as_bytes())
                .map_err(|_| Error::InvalidInput(format!("invalid method: {m}")))?,
        };

        let mode = match (self.navigate, self.no_cors) {
            (true, true) => {
                return Err(Error::InvalidInput("navigate and no_cors are mutually exclusive".into()).into());
            }
            (true, false) => RequestMode::Navigate,
            (false, true) => RequestMode::NoCors,
            (false, false) => RequestMode::Cors,
        };

        let mut request = Request::new(method, url).with_mode(mode);
        if let Some(accept) = &self.accept {
            let value = HeaderValue::from_str(accept)
                .map_err(|_| Error::InvalidInput(format!("invalid accept header: {accept}")))?;
            request = request.with_header(ACCEPT, value);
        } else if self.navigate {
            request = request.with_header(ACCEPT, HeaderValue::from_static(NAVIGATE_ACCEPT));
        }
        Ok(request)
    }
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(engine: &Engine, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()).into());
    }

    let request = params.to_request(engine.origin())?;
    let route = engine.route(&request);
    let served = engine.handle_fetch(&request).await?;
    let response = served.response;

    let output = SwFetchOutput {
        url: request.url.to_string(),
        final_url: response.url.to_string(),
        status: response.status.as_u16(),
        kind: response.kind,
        content_type: response.content_type().map(String::from),
        headers: header_map(&response.headers),
        body: String::from_utf8_lossy(&response.body).into_owned(),
        route,
        source: served.source,
        served_at: Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{engine, started_engine, text};
    use rmcp::model::ErrorCode;

    fn params(url: &str) -> SwFetchParams {
        SwFetchParams { url: url.into(), ..Default::default() }
    }

    #[tokio::test]
    async fn test_fetch_empty_url() {
        let result = fetch_impl(&engine(), params("  ")).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_to_request_resolves_path() {
        let origin = url::Url::parse("http://localhost:3000").unwrap();
        let req = SwFetchParams { navigate: true, ..params("/song/1#chorus") }.to_request(&origin).unwrap();
        assert_eq!(req.url.as_str(), "http://localhost:3000/song/1");
        assert!(req.is_navigation());
        assert!(req.accepts_html());
    }

    #[test]
    fn test_to_request_rejects_bad_input() {
        let origin = url::Url::parse("http://localhost:3000").unwrap();
        let bad_method = SwFetchParams { method: Some("GE T".into()), ..params("/") };
        assert!(bad_method.to_request(&origin).is_err());

        assert_eq!(bad_method.to_request(&origin).unwrap_err().code, ErrorCode(-32602));

        let both = SwFetchParams { navigate: true, no_cors: true, ..params("/") };
        assert_eq!(both.to_request(&origin).unwrap_err().code, ErrorCode(-32602));

        let bad_accept = SwFetchParams { accept: Some("text/html\n".into()), ..params("/") };
        assert_eq!(bad_accept.to_request(&origin).unwrap_err().code, ErrorCode(-32602));
    }

    #[tokio::test]
    async fn test_fetch_before_activation_passes_through() {
        let result = fetch_impl(&engine(), params("/app.js")).await.unwrap();
        let json = text(&result);
        assert_eq!(json["source"], "passthrough");
        assert_eq!(json["route"], serde_json::json!({"strategy": "cache_first"}));
    }

    #[tokio::test]
    async fn test_fetch_cache_first_round() {
        let engine = started_engine().await;

        let first = text(&fetch_impl(&engine, params("/app.js")).await.unwrap());
        assert_eq!(first["source"], "network");
        assert_eq!(first["body"], "/app.js");

        let second = text(&fetch_impl(&engine, params("/app.js")).await.unwrap());
        assert_eq!(second["source"], "cache");
    }

    #[tokio::test]
    async fn test_fetch_post_bypasses() {
        let engine = started_engine().await;
        let post = SwFetchParams { method: Some("post".into()), ..params("/api/votes") };
        let json = text(&fetch_impl(&engine, post).await.unwrap());
        assert_eq!(json["route"], serde_json::json!({"bypass": "method"}));
        assert_eq!(json["source"], "passthrough");
    }
}
