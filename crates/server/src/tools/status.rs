//! sw_status tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use swcache_client::Engine;

use super::json_result;

/// Report lifecycle state and store contents.
pub async fn status_impl(engine: &Engine) -> Result<CallToolResult, McpError> {
    let status = engine.status().await?;
    json_result(&status)
}
