//! Flashcard model

use serde::{Deserialize, Serialize};

/// A generated study card. Streamed from the server, never stored locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub question: String,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl Flashcard {
    /// Extracts a card from a stream payload.
    ///
    /// Accepts either a bare card object or one wrapped under a `flashcard` key.
    pub fn from_payload(payload: &serde_json::Value) -> Option<Self> {
        let candidate = payload.get("flashcard").unwrap_or(payload);
        serde_json::from_value(candidate.clone()).ok()
    }
}
