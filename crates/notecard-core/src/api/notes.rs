//! Note CRUD, listing and semantic search endpoints.

use reqwest::Method;
use serde_json::json;

use super::{to_body, ApiClient};
use crate::auth::TokenStorage;
use crate::error::ApiResult;
use crate::models::{Empty, NewNote, Note, NoteId, NoteUpdate, NotesPage, SearchResults};

/// Minimum similarity for a search hit when the caller has no preference.
pub const DEFAULT_SEARCH_THRESHOLD: f64 = 0.7;
/// Result cap for a search when the caller has no preference.
pub const DEFAULT_SEARCH_LIMIT: u32 = 10;

fn note_endpoint(id: &NoteId) -> String {
    format!("/api/notes/{}", urlencoding::encode(id.as_str()))
}

impl<S: TokenStorage> ApiClient<S> {
    pub async fn create_note(&self, note: &NewNote) -> ApiResult<Note> {
        tracing::debug!(title = %note.title, "Creating note");
        self.request(Method::POST, "/api/notes", Some(to_body(note)?))
            .await
    }

    /// Vector search over the caller's notes, ranked by the server.
    pub async fn search_notes(
        &self,
        query: &str,
        threshold: f64,
        limit: u32,
    ) -> ApiResult<SearchResults> {
        self.request(
            Method::POST,
            "/api/notes/search",
            Some(json!({ "query": query, "threshold": threshold, "limit": limit })),
        )
        .await
    }

    pub async fn user_notes(&self, limit: u32, offset: u32) -> ApiResult<NotesPage> {
        let endpoint = format!("/api/notes?limit={limit}&offset={offset}");
        self.request(Method::GET, &endpoint, None).await
    }

    pub async fn note(&self, id: &NoteId) -> ApiResult<Note> {
        self.request(Method::GET, &note_endpoint(id), None).await
    }

    pub async fn update_note(&self, id: &NoteId, update: &NoteUpdate) -> ApiResult<Note> {
        self.request(Method::PUT, &note_endpoint(id), Some(to_body(update)?))
            .await
    }

    pub async fn delete_note(&self, id: &NoteId) -> ApiResult<Empty> {
        self.request(Method::DELETE, &note_endpoint(id), None).await
    }

    /// Notes any user marked public. Works without a session.
    pub async fn public_notes(&self, limit: u32, offset: u32) -> ApiResult<NotesPage> {
        let endpoint = format!("/api/notes/public?limit={limit}&offset={offset}");
        self.request(Method::GET, &endpoint, None).await
    }
}
