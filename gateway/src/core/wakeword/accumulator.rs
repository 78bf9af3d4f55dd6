//! Transcript assembly across the recognizer's streaming modes.
//!
//! Results arrive as fragments. In single-pass modes the fragments are simply
//! appended. In two-pass mode the fast `2pass-online` fragments are shown
//! provisionally and then thrown away when the slower `2pass-offline`
//! correction for the same stretch of audio arrives.

use super::messages::{RecognitionFragment, RecognitionMode};

/// Text produced by applying one fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccumulatorOutput {
    /// Current reconstruction of the utterance
    pub text: String,
    /// Whether the utterance is closed
    pub is_final: bool,
}

/// Per-session transcript state.
///
/// Owned by a single relay task; never shared.
#[derive(Debug, Default, Clone)]
pub struct TranscriptAccumulator {
    online: String,
    offline: String,
    send: String,
}

impl TranscriptAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a fragment into the transcript and return the text to emit.
    ///
    /// A final output leaves the buffers untouched; the caller emits it and
    /// then calls [`reset`](Self::reset).
    pub fn apply(&mut self, fragment: &RecognitionFragment) -> AccumulatorOutput {
        let text = fragment.text.as_str();
        let is_final = match &fragment.mode {
            RecognitionMode::Online => {
                self.send.push_str(text);
                fragment.is_final
            }
            RecognitionMode::Offline => {
                self.send.push_str(text);
                true
            }
            RecognitionMode::TwoPassOnline => {
                self.online.push_str(text);
                self.send.clear();
                self.send.push_str(&self.offline);
                self.send.push_str(&self.online);
                false
            }
            RecognitionMode::TwoPassOffline(_) => {
                self.online.clear();
                self.send.clear();
                self.send.push_str(&self.offline);
                self.send.push_str(text);
                self.offline.push_str(text);
                true
            }
        };

        AccumulatorOutput {
            text: self.send.clone(),
            is_final,
        }
    }

    /// Clear all buffers at an utterance boundary.
    pub fn reset(&mut self) {
        self.online.clear();
        self.offline.clear();
        self.send.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.online.is_empty() && self.offline.is_empty() && self.send.is_empty()
    }

    /// Text currently shown for the utterance.
    pub fn text(&self) -> &str {
        &self.send
    }
}
