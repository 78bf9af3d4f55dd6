//! Client-facing framing.
//!
//! Every client message is one binary WebSocket frame:
//!
//! ```text
//! +----------------------------+------------------+-----------------+
//! | action (32 bytes, ASCII,   | payload length   | payload         |
//! | NUL padded)                | (u32 big-endian) | (length bytes)  |
//! +----------------------------+------------------+-----------------+
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;
use thiserror::Error;

/// Width of the action field.
pub const ACTION_HEADER_LEN: usize = 32;

/// Action field plus the length prefix.
pub const FRAME_HEADER_LEN: usize = ACTION_HEADER_LEN + 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame too short: {0} bytes")]
    TooShort(usize),

    #[error("action is empty")]
    EmptyAction,

    #[error("action is not ASCII")]
    InvalidAction,

    #[error("action too long: {0} bytes")]
    ActionTooLong(usize),

    #[error("payload length {declared} does not match {actual} bytes received")]
    LengthMismatch { declared: usize, actual: usize },
}

/// Action tags exchanged with the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClientAction {
    Ping,
    Pong,
    EngineStart,
    EngineInitializing,
    EngineStarted,
    EnginePartialInput,
    EngineFinalInput,
    EnginePartialOutput,
    EngineFinalOutput,
    EngineStop,
    EngineStopped,
    WakewordDetected,
    Error,
    /// Any tag outside the vocabulary, kept so it can be reported back
    Unknown(String),
}

impl ClientAction {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Ping => "PING",
            Self::Pong => "PONG",
            Self::EngineStart => "ENGINE_START",
            Self::EngineInitializing => "ENGINE_INITIALIZING",
            Self::EngineStarted => "ENGINE_STARTED",
            Self::EnginePartialInput => "ENGINE_PARTIAL_INPUT",
            Self::EngineFinalInput => "ENGINE_FINAL_INPUT",
            Self::EnginePartialOutput => "ENGINE_PARTIAL_OUTPUT",
            Self::EngineFinalOutput => "ENGINE_FINAL_OUTPUT",
            Self::EngineStop => "ENGINE_STOP",
            Self::EngineStopped => "ENGINE_STOPPED",
            Self::WakewordDetected => "WAKEWORD_DETECTED",
            Self::Error => "ERROR",
            Self::Unknown(name) => name,
        }
    }

    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "PING" => Self::Ping,
            "PONG" => Self::Pong,
            "ENGINE_START" => Self::EngineStart,
            "ENGINE_INITIALIZING" => Self::EngineInitializing,
            "ENGINE_STARTED" => Self::EngineStarted,
            "ENGINE_PARTIAL_INPUT" => Self::EnginePartialInput,
            "ENGINE_FINAL_INPUT" => Self::EngineFinalInput,
            "ENGINE_PARTIAL_OUTPUT" => Self::EnginePartialOutput,
            "ENGINE_FINAL_OUTPUT" => Self::EngineFinalOutput,
            "ENGINE_STOP" => Self::EngineStop,
            "ENGINE_STOPPED" => Self::EngineStopped,
            "WAKEWORD_DETECTED" => Self::WakewordDetected,
            "ERROR" => Self::Error,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for ClientAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decoded client message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientFrame {
    pub action: ClientAction,
    pub payload: Bytes,
}

impl ClientFrame {
    pub fn new(action: ClientAction, payload: impl Into<Bytes>) -> Self {
        Self {
            action,
            payload: payload.into(),
        }
    }

    /// Frame with no payload.
    pub fn signal(action: ClientAction) -> Self {
        Self::new(action, Bytes::new())
    }

    pub fn encode(&self) -> Result<Bytes, FrameError> {
        encode(&self.action, &self.payload)
    }
}

/// Serialize an action and payload into one frame.
pub fn encode(action: &ClientAction, payload: &[u8]) -> Result<Bytes, FrameError> {
    let tag = action.as_str().as_bytes();
    if tag.is_empty() {
        return Err(FrameError::EmptyAction);
    }
    if tag.len() > ACTION_HEADER_LEN {
        return Err(FrameError::ActionTooLong(tag.len()));
    }
    if !tag.is_ascii() {
        return Err(FrameError::InvalidAction);
    }

    let mut buf = BytesMut::with_capacity(FRAME_HEADER_LEN + payload.len());
    buf.put_slice(tag);
    buf.put_bytes(0, ACTION_HEADER_LEN - tag.len());
    buf.put_u32(payload.len() as u32);
    buf.put_slice(payload);
    Ok(buf.freeze())
}

/// Parse one frame. The payload is a zero-copy slice of `frame`.
pub fn decode(frame: Bytes) -> Result<ClientFrame, FrameError> {
    if frame.len() < FRAME_HEADER_LEN {
        return Err(FrameError::TooShort(frame.len()));
    }

    let raw_tag = &frame[..ACTION_HEADER_LEN];
    let tag_len = raw_tag
        .iter()
        .position(|&b| b == 0)
        .unwrap_or(ACTION_HEADER_LEN);
    let tag = &raw_tag[..tag_len];
    if tag.is_empty() {
        return Err(FrameError::EmptyAction);
    }
    if !tag.is_ascii() {
        return Err(FrameError::InvalidAction);
    }
    let tag = std::str::from_utf8(tag).map_err(|_| FrameError::InvalidAction)?;

    let mut len_bytes = [0u8; 4];
    len_bytes.copy_from_slice(&frame[ACTION_HEADER_LEN..FRAME_HEADER_LEN]);
    let declared = u32::from_be_bytes(len_bytes) as usize;
    let actual = frame.len() - FRAME_HEADER_LEN;
    if declared != actual {
        return Err(FrameError::LengthMismatch { declared, actual });
    }

    Ok(ClientFrame {
        action: ClientAction::from_tag(tag),
        payload: frame.slice(FRAME_HEADER_LEN..),
    })
}
