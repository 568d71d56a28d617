//! Errors raised by the tool layer itself rather than by the engine.
//!
//! Bad tool parameters are reported with `swcache_core::Error::InvalidInput`.

use rmcp::model::{ErrorCode, ErrorData as McpError};

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Tool output could not be encoded.
    #[error("ENCODE_FAILED: {0}")]
    Encode(String),
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let (code, message) = match &err {
            ToolError::Encode(msg) => (-32603, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        ToolError::Encode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_code() {
        let err: McpError = ToolError::Encode("boom".into()).into();
        assert_eq!(err.code, ErrorCode(-32603));
        assert_eq!(err.message, "boom");
    }
}
