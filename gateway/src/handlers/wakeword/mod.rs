//! Wake-word spotting WebSocket
//!
//! Each connection is a session relaying client audio to the streaming
//! recognizer and recognizer results back to the client. All messages are
//! binary frames carrying an action tag and a payload, see [`protocol`].
//!
//! ## Client → Server
//!
//! - **PING**: liveness probe, answered with `PONG`
//! - **ENGINE_PARTIAL_INPUT**: an audio chunk
//! - **ENGINE_FINAL_INPUT**: the last audio chunk of an utterance
//! - **ENGINE_STOP**: end the session
//!
//! ## Server → Client
//!
//! - **ENGINE_INITIALIZING**, **ENGINE_STARTED**: session setup progress
//! - **ENGINE_PARTIAL_OUTPUT**: provisional transcript (UTF-8 text)
//! - **ENGINE_FINAL_OUTPUT**: closed utterance transcript (UTF-8 text)
//! - **WAKEWORD_DETECTED**: JSON `{"text", "wakeword": true, "phrase"}`
//! - **ENGINE_STOPPED**: reply to `ENGINE_STOP`
//! - **ERROR**: error description (UTF-8 text)

mod handler;
pub mod messages;
pub mod protocol;
mod relay;
pub mod session;

pub use handler::wakeword_handler;
pub use messages::{ClientRoute, ClientSender, WakewordDetectedPayload, WakewordQuery};
pub use protocol::{ClientAction, ClientFrame, FrameError, decode, encode};
pub use relay::RelayExit;
pub use session::{Session, SessionParams, SessionState};
