//! Data models for Notecard
//!
//! These mirror the server's JSON shapes. The client only transports them, so
//! timestamps stay in the RFC 3339 form the server sends.

mod flashcard;
mod note;
mod user;

pub use flashcard::Flashcard;
pub use note::{NewNote, Note, NoteId, NoteUpdate, NotesPage, SearchNotesItem, SearchResults};
pub use user::{CurrentUser, OAuthResponse, ProfileInput, User, UserProfile, UsersPage};

use serde::{Deserialize, Serialize};

/// Acknowledgement body for operations without a meaningful payload.
///
/// Accepts any JSON object, including the empty one produced for
/// `204 No Content` responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}
