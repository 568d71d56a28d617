//! cache_get tool implementation.
//!
//! Retrieves the stored entry for a URL from the current store.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use swcache_client::fetch::canonicalize;
use swcache_client::{Engine, Request};
use swcache_core::Error;

use crate::tools::{header_map, json_result};

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Absolute URL, or a path resolved against the application origin.
    pub url: String,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize)]
pub struct CacheGetOutput {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub headers: BTreeMap<String, String>,
    /// Body decoded as UTF-8, lossily.
    pub body: String,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(engine: &Engine, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let url =
        canonicalize(&params.url, engine.origin()).map_err(|e| Error::InvalidUrl(format!("{}: {e}", params.url)))?;

    let response = engine
        .cached(&Request::get(url.clone()))
        .await?
        .ok_or_else(|| Error::CacheMiss(url.to_string()))?;

    let output = CacheGetOutput {
        url: url.to_string(),
        status: response.status.as_u16(),
        content_type: response.content_type().map(String::from),
        headers: header_map(&response.headers),
        body: String::from_utf8_lossy(&response.body).into_owned(),
    };

    json_result(&output)
}
