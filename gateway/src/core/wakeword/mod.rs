//! Wake-word spotting on top of a streaming FunASR recognizer.
//!
//! The recognizer does the speech-to-text work; this module turns its
//! mode-tagged results into a running transcript and checks that transcript
//! for configured wake phrases.
//!
//! # Architecture
//!
//! - [`matcher`]: wake phrase set and substring matching
//! - [`accumulator`]: transcript assembly across `online`, `offline`,
//!   `2pass-online` and `2pass-offline` results
//! - [`messages`]: recognizer wire format
//! - [`upstream`]: the WebSocket connection to the recognizer
//!
//! The client-facing session that wires these together lives in
//! `handlers::wakeword`.

pub mod accumulator;
mod error;
pub mod matcher;
pub mod messages;
pub mod upstream;

pub use accumulator::{AccumulatorOutput, TranscriptAccumulator};
pub use error::{WakewordError, WakewordResult};
pub use matcher::{WakeEvent, WakePhraseSet, check, detect};
pub use messages::{InitMessage, RecognitionFragment, RecognitionMode, SpeakingMessage};
pub use upstream::{DEFAULT_SUBPROTOCOL, UpstreamChannel, UpstreamReceiver, UpstreamSender};
