//! WebSocket message types for the FunASR streaming recognition protocol.
//!
//! - **Outgoing messages** (gateway to recognizer)
//!   - [`InitMessage`]: session handshake with chunk geometry, mode and hotwords
//!   - [`SpeakingMessage`]: `is_speaking` toggles for utterance boundaries
//!   - Binary audio data (sent directly, no JSON wrapper)
//!
//! - **Incoming messages** (recognizer to gateway)
//!   - [`RecognitionFragment`]: one partial or final result, tagged by mode

use serde::{Deserialize, Serialize};

use super::error::WakewordResult;

// =============================================================================
// Streaming geometry
// =============================================================================

/// Chunk size in 60 ms units: look-back, current, look-ahead.
pub const CHUNK_SIZE: [u32; 3] = [5, 10, 5];

/// Interval between decoding passes, in chunks.
pub const CHUNK_INTERVAL: u32 = 10;

/// Number of chunks the encoder looks back over.
pub const ENCODER_CHUNK_LOOK_BACK: u32 = 4;

/// Number of chunks the decoder looks back over.
pub const DECODER_CHUNK_LOOK_BACK: u32 = 0;

// =============================================================================
// Outgoing Messages (Gateway to Recognizer)
// =============================================================================

/// Handshake sent once, before any audio.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InitMessage {
    /// Recognition mode requested from the server (`online`, `offline`, `2pass`)
    pub mode: String,
    pub chunk_size: [u32; 3],
    pub chunk_interval: u32,
    pub encoder_chunk_look_back: u32,
    pub decoder_chunk_look_back: u32,
    /// Session tag echoed back by the server
    pub wav_name: String,
    pub is_speaking: bool,
    /// Space-joined hotword hint
    pub hotwords: String,
    /// Inverse text normalization
    pub itn: bool,
}

impl InitMessage {
    pub fn new(mode: &str, wav_name: &str, hotwords: String) -> Self {
        Self {
            mode: mode.to_string(),
            chunk_size: CHUNK_SIZE,
            chunk_interval: CHUNK_INTERVAL,
            encoder_chunk_look_back: ENCODER_CHUNK_LOOK_BACK,
            decoder_chunk_look_back: DECODER_CHUNK_LOOK_BACK,
            wav_name: wav_name.to_string(),
            is_speaking: true,
            hotwords,
            itn: true,
        }
    }
}

/// Speech boundary marker.
///
/// `{"is_speaking": false}` closes the current utterance; sending it followed
/// by `{"is_speaking": true}` resets the recognizer's sentence context.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpeakingMessage {
    pub is_speaking: bool,
}

impl SpeakingMessage {
    pub const STOPPED: Self = Self { is_speaking: false };
    pub const STARTED: Self = Self { is_speaking: true };
}

// =============================================================================
// Incoming Messages (Recognizer to Gateway)
// =============================================================================

/// Streaming mode a recognition result was produced in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionMode {
    /// Low-latency streaming pass
    Online,
    /// Whole-utterance pass
    Offline,
    /// Streaming pass of a two-pass session
    TwoPassOnline,
    /// Correction pass of a two-pass session. Any unrecognized mode string is
    /// treated the same way and is kept here for logging.
    TwoPassOffline(String),
}

impl RecognitionMode {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "online" => Self::Online,
            "offline" => Self::Offline,
            "2pass-online" => Self::TwoPassOnline,
            other => Self::TwoPassOffline(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::TwoPassOnline => "2pass-online",
            Self::TwoPassOffline(tag) => tag,
        }
    }
}

/// One recognition result from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionFragment {
    pub mode: RecognitionMode,
    pub text: String,
    pub is_final: bool,
}

#[derive(Deserialize)]
struct RawResult {
    #[serde(default)]
    mode: Option<serde_json::Value>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    is_final: Option<bool>,
}

impl RecognitionFragment {
    pub fn new(mode: RecognitionMode, text: impl Into<String>, is_final: bool) -> Self {
        Self {
            mode,
            text: text.into(),
            is_final,
        }
    }

    /// Parse a text frame from the server.
    ///
    /// Returns `Ok(None)` for frames without a string `mode` field; those are
    /// not recognition results and are skipped by the caller.
    pub fn parse(text: &str) -> WakewordResult<Option<Self>> {
        let raw: RawResult = serde_json::from_str(text)?;
        let Some(tag) = raw.mode.as_ref().and_then(|m| m.as_str()) else {
            return Ok(None);
        };
        Ok(Some(Self {
            mode: RecognitionMode::from_tag(tag),
            text: raw.text.unwrap_or_default(),
            is_final: raw.is_final.unwrap_or(false),
        }))
    }
}
