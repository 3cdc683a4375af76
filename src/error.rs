//! Error types for the anki2md library.
//!
//! Two failure modes exist and only one of them is an error type:
//!
//! * [`Anki2MdError`] — **Fatal**: the operation cannot produce meaningful
//!   content (AnkiConnect unreachable, the scheduler rejected an answer,
//!   invalid configuration). Returned as `Err(Anki2MdError)` from the
//!   scheduler, media-store and session APIs.
//!
//! * **Recovered locally**: a single media reference that cannot be resolved,
//!   a malformed percent-escape in a filename, or HTML the translator cannot
//!   make sense of. These never surface as errors; the affected text is left
//!   as it was and the event is logged through `tracing`.
//!
//! The conversion functions in [`crate::convert`] are therefore infallible,
//! and callers only handle errors at the service boundary.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the anki2md library.
#[derive(Debug, Error)]
pub enum Anki2MdError {
    // ── Service errors ────────────────────────────────────────────────────
    /// AnkiConnect could not be reached at all.
    #[error("Cannot reach AnkiConnect at '{endpoint}': {reason}\nIs Anki running with the AnkiConnect add-on installed?")]
    Unreachable { endpoint: String, reason: String },

    /// AnkiConnect answered but reported an error for the action.
    #[error("AnkiConnect action '{action}' failed: {message}")]
    AnkiConnect { action: String, message: String },

    /// The response body could not be decoded into the expected shape.
    #[error("Invalid response to AnkiConnect action '{action}': {detail}")]
    InvalidResponse { action: String, detail: String },

    /// The scheduler accepted the request but did not record the answer.
    #[error("Answer for card {card_id} was not recorded by the scheduler")]
    AnswerRejected { card_id: u64 },

    /// The card shown in the Anki reviewer is not the one being answered.
    #[error("Reviewer is showing card {shown} but card {expected} was answered")]
    CardMismatch { expected: u64, shown: u64 },

    /// An answer for this card is still being submitted.
    #[error("An answer for card {card_id} is already being submitted")]
    AnswerInFlight { card_id: u64 },

    /// An answer was submitted while no card is being shown.
    #[error("No card is being reviewed; fetch a card before answering")]
    NoCardShown,

    // ── Input errors ──────────────────────────────────────────────────────
    /// A grade outside the four-level ease scale.
    #[error("Invalid ease '{input}': expected again, hard, good, easy or 1–4")]
    InvalidEase { input: String },

    /// A media filename that would resolve outside the media directory.
    #[error("Media filename '{filename}' escapes the media directory")]
    InvalidMediaName { filename: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Reading from the local media directory failed.
    #[error("Failed to read media file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Anki2MdError {
    /// Whether the error means the external service could not be used at all.
    ///
    /// The display layer uses this to choose between a "start Anki" hint and
    /// a plain failure notification.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Anki2MdError::Unreachable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_display() {
        let e = Anki2MdError::Unreachable {
            endpoint: "http://127.0.0.1:8765".into(),
            reason: "connection refused".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("127.0.0.1:8765"), "got: {msg}");
        assert!(msg.contains("connection refused"));
        assert!(e.is_unavailable());
    }

    #[test]
    fn anki_connect_display() {
        let e = Anki2MdError::AnkiConnect {
            action: "findCards".into(),
            message: "collection is not available".into(),
        };
        assert!(e.to_string().contains("findCards"));
        assert!(!e.is_unavailable());
    }

    #[test]
    fn card_mismatch_display() {
        let e = Anki2MdError::CardMismatch {
            expected: 1,
            shown: 2,
        };
        let msg = e.to_string();
        assert!(msg.contains("card 2"));
        assert!(msg.contains("card 1"));
    }

    #[test]
    fn invalid_ease_display() {
        let e = Anki2MdError::InvalidEase {
            input: "perfect".into(),
        };
        assert!(e.to_string().contains("perfect"));
    }
}
