pub mod auth_cmd;
pub mod common;
pub mod completions;
pub mod config;
pub mod flashcards;
pub mod health;
pub mod notes;
pub mod users;
