//! notecard-core - Core library for Notecard
//!
//! This crate contains the typed API client, the authentication state shared by
//! every Notecard front end, and the small display helpers (timestamps and
//! markdown) used when presenting notes.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod format;
pub mod markdown;
pub mod models;
pub mod util;

#[cfg(test)]
mod test_server;

pub use api::{ApiClient, StreamHandle};
pub use auth::{AuthContext, AuthStore, MemoryTokenStorage, TokenStorage};
pub use config::ClientConfig;
pub use error::{ApiError, ApiResult};
pub use models::{Flashcard, Note, SearchNotesItem, User, UserProfile};
