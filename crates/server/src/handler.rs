//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the engine.
use std::sync::Arc;

use crate::tools::{
    CacheGetParams, CacheListParams, SwFetchParams, SwMessageParams,
    cache::{get_impl, list_impl},
    fetch::fetch_impl,
    message::message_impl,
    status::status_impl,
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use swcache_client::{Engine, UpdateChannel};

/// The main MCP server handler for swcache.
#[derive(Clone)]
pub struct SwCacheServer {
    tool_router: ToolRouter<Self>,
    engine: Arc<Engine>,
    channel: UpdateChannel,
}

/// Tool router implementation using the #[tool_router] macro.
#[tool_router]
impl SwCacheServer {
    /// Create a new server handler around a running engine.
    pub fn new(engine: Arc<Engine>, channel: UpdateChannel) -> Self {
        Self { tool_router: Self::tool_router(), engine, channel }
    }

    #[tool(
        description = "Fetch a URL through the caching engine. Returns status, headers, body, the route taken (bypass or strategy) and where the response came from (network, cache, fallback, passthrough)."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.engine, params.0).await
    }

    #[tool(description = "Post a control message to the engine. \"skipWaiting\" activates an installed version; other values are ignored. Fire-and-forget.")]
    async fn sw_message(&self, params: Parameters<SwMessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.channel, params.0)
    }

    #[tool(description = "Report the lifecycle state, the current store name, all store names and the current store's entry count.")]
    async fn sw_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.engine).await
    }

    #[tool(description = "Read the stored entry for a URL from the current store. No network access.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.engine, params.0).await
    }

    #[tool(description = "List the URLs held by the current store. No network access.")]
    async fn cache_list(&self, params: Parameters<CacheListParams>) -> Result<CallToolResult, McpError> {
        list_impl(&self.engine, params.0).await
    }
}

impl ServerHandler for SwCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "swcache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::engine;

    #[tokio::test]
    async fn test_lists_every_tool() {
        let engine = engine();
        let (channel, _listener) = UpdateChannel::spawn(Arc::clone(&engine));
        let server = SwCacheServer::new(engine, channel);

        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();
        assert_eq!(names, ["cache_get", "cache_list", "sw_fetch", "sw_message", "sw_status"]);
    }

    #[tokio::test]
    async fn test_server_info() {
        let engine = engine();
        let (channel, _listener) = UpdateChannel::spawn(Arc::clone(&engine));
        let info = SwCacheServer::new(engine, channel).get_info();
        assert_eq!(info.server_info.name, "swcache");
        assert!(info.capabilities.tools.is_some());
    }
}
