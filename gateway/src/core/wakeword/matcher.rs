//! Wake phrase configuration and transcript matching.

use std::fmt;
use std::sync::Arc;

/// An immutable set of wake phrases.
///
/// Phrases are trimmed, non-empty and case-sensitive. Duplicates are dropped
/// while keeping the first occurrence, so iteration follows configuration
/// order. Cloning is cheap; a running session holds its own snapshot.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct WakePhraseSet {
    phrases: Arc<[String]>,
}

impl WakePhraseSet {
    /// Parse a comma-separated phrase list such as `"hey robot, wake up"`.
    pub fn parse(list: &str) -> Self {
        Self::from_phrases(list.split(','))
    }

    /// Build a set from individual phrases, trimming and de-duplicating them.
    pub fn from_phrases<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut unique: Vec<String> = Vec::new();
        for phrase in phrases {
            let phrase = phrase.as_ref().trim();
            if !phrase.is_empty() && !unique.iter().any(|p| p == phrase) {
                unique.push(phrase.to_string());
            }
        }
        Self {
            phrases: unique.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.phrases.iter().map(String::as_str)
    }

    /// Space-joined phrases, passed upstream as a recognition hint.
    ///
    /// Hotwords only bias the recognizer; a match is always re-checked
    /// against the returned text with [`check`].
    pub fn hotwords(&self) -> String {
        self.phrases.join(" ")
    }

    /// Pick the phrase set for a session: a non-empty runtime list replaces
    /// the configured one, otherwise the configured set is kept.
    pub fn with_override(&self, runtime: Option<&str>) -> Self {
        match runtime.map(Self::parse) {
            Some(set) if !set.is_empty() => set,
            _ => self.clone(),
        }
    }
}

impl fmt::Debug for WakePhraseSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.phrases.iter()).finish()
    }
}

/// A wake phrase found in a transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WakeEvent {
    /// The transcript the phrase was found in
    pub text: String,
    /// The configured phrase that matched
    pub matched_phrase: String,
}

/// Return the first wake phrase that occurs as a contiguous substring of `text`.
///
/// When several phrases match at once, which one is reported does not matter
/// for signalling; the first in configuration order wins.
pub fn check<'a>(text: &str, phrases: &'a WakePhraseSet) -> Option<&'a str> {
    if text.is_empty() {
        return None;
    }
    phrases.iter().find(|phrase| text.contains(*phrase))
}

/// Like [`check`], but packages the match as a [`WakeEvent`].
pub fn detect(text: &str, phrases: &WakePhraseSet) -> Option<WakeEvent> {
    check(text, phrases).map(|phrase| WakeEvent {
        text: text.to_string(),
        matched_phrase: phrase.to_string(),
    })
}
