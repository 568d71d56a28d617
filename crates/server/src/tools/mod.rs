//! MCP tool implementations.
//!
//! Each tool is a thin adapter from JSON parameters to one engine call.

pub mod cache;
pub mod fetch;
pub mod message;
pub mod status;

pub use cache::{CacheGetParams, CacheListParams};
pub use fetch::SwFetchParams;
pub use message::SwMessageParams;

use reqwest::header::HeaderMap;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::ToolError;

/// Render a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(ToolError::from)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Headers as a sorted name -> value map; non-text values are skipped.
pub(crate) fn header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use async_trait::async_trait;
    use bytes::Bytes;
    use reqwest::StatusCode;
    use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
    use std::sync::Arc;
    use swcache_client::{Engine, Network, Request, Response, ResponseKind};
    use swcache_core::{AppConfig, Error, MemoryStorage, StoreBackend};

    /// Answers every http(s) request with 200 and the request path as body.
    pub(crate) struct EchoNetwork;

    #[async_trait]
    impl Network for EchoNetwork {
        async fn fetch(&self, request: &Request) -> Result<Response, Error> {
            if !matches!(request.url.scheme(), "http" | "https") {
                return Err(Error::Network(format!("unsupported scheme: {}", request.url.scheme())));
            }
            let mut headers = HeaderMap::new();
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
            Ok(Response {
                url: request.url.clone(),
                status: StatusCode::OK,
                headers,
                body: Bytes::from(request.url.path().to_string()),
                kind: ResponseKind::Basic,
            })
        }
    }

    pub(crate) fn config() -> AppConfig {
        AppConfig { store_backend: StoreBackend::Memory, ..AppConfig::default() }
    }

    pub(crate) fn engine_with(config: &AppConfig) -> Arc<Engine> {
        Arc::new(Engine::new(config, Arc::new(MemoryStorage::new()), Arc::new(EchoNetwork)).unwrap())
    }

    pub(crate) fn engine() -> Arc<Engine> {
        engine_with(&config())
    }

    pub(crate) async fn started_engine() -> Arc<Engine> {
        let engine = engine();
        engine.start().await.unwrap();
        engine
    }

    pub(crate) fn text(result: &rmcp::model::CallToolResult) -> serde_json::Value {
        let content = result.content.first().and_then(|c| c.as_text()).unwrap();
        serde_json::from_str(&content.text).unwrap()
    }
}
