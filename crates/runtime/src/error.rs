//! Error types for the WeCom runtime.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the WeCom runtime.
#[derive(Debug, Error)]
pub enum Error {
    /// The bridge executable was not found.
    #[error("WeCom bridge not found. Set WECOM_BRIDGE or put wecom-bridge on PATH.")]
    BridgeNotFound,

    /// Failed to launch the bridge process.
    #[error("Failed to launch WeCom bridge: {0}")]
    LaunchFailed(String),

    /// Failed to establish a session with the bridge.
    #[error("Failed to connect to WeCom bridge: {0}")]
    ConnectionFailed(String),

    /// Transport-level error (stdio framing).
    #[error("Transport error: {0}")]
    TransportError(String),

    /// Protocol-level error (malformed or unexpected frames).
    #[error("Protocol error: {0}")]
    ProtocolError(String),

    /// Error reported by the bridge for a request.
    #[error("{name}: {message}")]
    Remote {
        /// Error class name (e.g. "NotLoggedIn", "SendFailed").
        name: String,
        /// Human-readable message from the bridge.
        message: String,
        /// Numeric client error code, if reported.
        code: Option<i32>,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Timeout waiting for an operation (e.g. login).
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Channel closed unexpectedly.
    #[error("Channel closed unexpectedly")]
    ChannelClosed,
}

impl Error {
    /// Returns the error name if this is a Remote error.
    pub fn error_name(&self) -> Option<&str> {
        match self {
            Error::Remote { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Returns true if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Timeout(_) => true,
            Error::Remote { name, .. } => name == "Timeout",
            _ => false,
        }
    }

    /// Returns true if the session is unusable and should be closed.
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            Error::ChannelClosed | Error::TransportError(_) | Error::ConnectionFailed(_)
        )
    }
}
