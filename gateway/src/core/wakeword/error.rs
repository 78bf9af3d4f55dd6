//! Error types for wake-word sessions.

use thiserror::Error;

/// Errors that can occur while relaying a wake-word session.
#[derive(Debug, Error)]
pub enum WakewordError {
    /// The recognition service could not be reached (refused, timeout, TLS or
    /// WebSocket handshake failure).
    #[error("Upstream unreachable: {0}")]
    UpstreamUnreachable(String),

    /// The upstream connection has been closed, by either side.
    #[error("Upstream connection closed")]
    UpstreamClosed,

    /// Sending to or receiving from the upstream connection failed.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// The client connection is gone.
    #[error("Client disconnected")]
    ClientDisconnected,

    /// The client sent an action that is not valid in the current state.
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// A frame could not be decoded.
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// JSON (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WakewordError {
    /// Whether this error is an expected transport disconnect rather than a fault.
    ///
    /// Disconnects end a relay normally and are never reported to the client.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::UpstreamClosed | Self::ClientDisconnected)
    }
}

/// Result type for wake-word operations.
pub type WakewordResult<T> = Result<T, WakewordError>;
