//! Inbound control messages from the surrounding application.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::Engine;

/// A recognized control message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    /// Leave Waiting and activate now.
    SkipWaiting,
}

impl ControlMessage {
    /// Anything other than the exact string `skipWaiting` is not a message.
    pub fn parse(data: &str) -> Option<Self> {
        match data {
            "skipWaiting" => Some(Self::SkipWaiting),
            _ => None,
        }
    }
}

/// Fire-and-forget sender side of the control channel.
#[derive(Debug, Clone)]
pub struct UpdateChannel {
    tx: mpsc::UnboundedSender<String>,
}

impl UpdateChannel {
    /// Start a listener task that feeds every posted message to `engine`.
    pub fn spawn(engine: Arc<Engine>) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let listener = tokio::spawn(async move {
            while let Some(data) = rx.recv().await {
                if let Err(e) = engine.handle_message(&data).await {
                    tracing::warn!(error = %e, "control message failed");
                }
            }
            tracing::debug!("update channel closed");
        });
        (Self { tx }, listener)
    }

    /// Post a message. Returns false only if the listener is gone.
    pub fn post(&self, data: impl Into<String>) -> bool {
        self.tx.send(data.into()).is_ok()
    }
}
