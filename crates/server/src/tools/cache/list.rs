//! cache_list tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::Engine;

use crate::tools::json_result;

/// Parameters for the cache_list tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheListParams {
    /// Only list URLs containing this substring.
    #[serde(default)]
    pub contains: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheListOutput {
    pub store: String,
    pub urls: Vec<String>,
}

/// List the URLs held by the current store, sorted.
pub async fn list_impl(engine: &Engine, params: CacheListParams) -> Result<CallToolResult, McpError> {
    let mut urls = engine.cached_urls().await?;
    if let Some(needle) = params.contains.as_deref() {
        urls.retain(|u| u.contains(needle));
    }

    let store = engine.lifecycle().version().store_name().to_string();
    json_result(&CacheListOutput { store, urls })
}
