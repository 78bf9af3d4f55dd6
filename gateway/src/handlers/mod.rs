//! HTTP and WebSocket request handlers
//!
//! - `api` - Health check endpoint
//! - `transcribe` - One-shot transcription through a Dify workflow
//! - `wakeword` - Wake-word spotting WebSocket

pub mod api;
pub mod transcribe;
pub mod wakeword;

// Re-export commonly used handlers for convenient access
pub use transcribe::dify_transcribe;
pub use wakeword::wakeword_handler;
