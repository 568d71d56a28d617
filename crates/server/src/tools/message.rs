//! sw_message tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::UpdateChannel;

use super::json_result;

/// Input parameters for the sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageParams {
    /// Message payload. Only `skipWaiting` has an effect.
    pub data: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SwMessageOutput {
    /// Whether the message was handed to the listener. Nothing is
    /// acknowledged beyond that.
    pub posted: bool,
}

/// Post a control message and return immediately.
pub fn message_impl(channel: &UpdateChannel, params: SwMessageParams) -> Result<CallToolResult, McpError> {
    let posted = channel.post(params.data);
    json_result(&SwMessageOutput { posted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{config, engine, engine_with, text};
    use std::sync::Arc;
    use std::time::Duration;
    use swcache_client::LifecycleState;
    use swcache_core::AppConfig;

    #[tokio::test]
    async fn test_skip_waiting_activates_installed_engine() {
        let engine = engine_with(&AppConfig { skip_waiting_on_install: false, ..config() });
        assert_eq!(engine.start().await.unwrap(), LifecycleState::Waiting);
        let mut state = engine.lifecycle().subscribe();
        let (channel, _listener) = UpdateChannel::spawn(Arc::clone(&engine));

        let result = message_impl(&channel, SwMessageParams { data: "skipWaiting".into() }).unwrap();
        assert_eq!(text(&result)["posted"], true);

        tokio::time::timeout(Duration::from_secs(5), state.wait_for(|s| *s == LifecycleState::Active))
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_closed_channel_reports_not_posted() {
        let (channel, listener) = UpdateChannel::spawn(engine());
        listener.abort();
        let _ = listener.await;

        let result = message_impl(&channel, SwMessageParams { data: "skipWaiting".into() }).unwrap();
        assert_eq!(text(&result)["posted"], false);
    }
}
