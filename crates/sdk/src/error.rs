//! Errors surfaced by the SDK

use crate::connection::ConnectionState;

/// Every failure an SDK call can report.
///
/// Callers sharing one connect attempt all receive a clone of its outcome.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SdkError {
    #[error("Connection timeout")]
    ConnectTimeout,
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Gateway rejected the connection")]
    HandshakeRejected,
    #[error("Not connected (state: {state})")]
    NotConnected { state: ConnectionState },
    #[error("Action timed out: {action}")]
    ActionTimeout { action: &'static str },
    #[error("Screenshot timed out")]
    ScreenshotTimeout,
    #[error("Connection closed")]
    ConnectionClosed,
    /// Failure text reported by the gateway
    #[error("{0}")]
    Gateway(String),
    #[error("No result in action response")]
    MissingResult,
    #[error("Timed out waiting for {0}")]
    WaitTimeout(&'static str),
    #[error("Connection failed")]
    ConnectionFailed,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Failed to encode message: {0}")]
    Encode(String),
}

impl From<rsbot_protocol::ProtocolError> for SdkError {
    fn from(err: rsbot_protocol::ProtocolError) -> Self {
        SdkError::Encode(err.to_string())
    }
}
