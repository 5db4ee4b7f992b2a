//! Streaming flashcard generation.
//!
//! Both endpoints answer with SSE. Each payload is handed to the callback as raw
//! JSON; use [`Flashcard::from_payload`](crate::models::Flashcard::from_payload)
//! to pick out cards.

use serde_json::{json, Value};

use super::{ApiClient, StreamHandle};
use crate::auth::TokenStorage;
use crate::models::NoteId;

impl<S: TokenStorage> ApiClient<S> {
    /// Generates flashcards for a free-text topic.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn stream_flashcards_from_query<F>(&self, query: &str, on_message: F) -> StreamHandle
    where
        F: FnMut(Value) + Send + 'static,
    {
        self.spawn_stream(
            "/api/notes/flashcard/query",
            json!({ "query": query }),
            on_message,
        )
    }

    /// Generates flashcards from existing notes.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn stream_flashcards_from_notes<F>(&self, note_ids: &[NoteId], on_message: F) -> StreamHandle
    where
        F: FnMut(Value) + Send + 'static,
    {
        self.spawn_stream(
            "/api/notes/flashcard/notes",
            json!({ "note_ids": note_ids }),
            on_message,
        )
    }
}
