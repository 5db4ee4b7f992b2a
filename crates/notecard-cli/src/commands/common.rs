use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use notecard_core::format::TimeFormatter;
use notecard_core::models::{NoteId, SearchNotesItem};
use notecard_core::{AuthContext, Note, UserProfile};
use serde::Serialize;

use crate::auth::KeyringTokenStorage;
use crate::config_profiles::CliProfilesConfig;
use crate::error::CliError;

/// A resolved profile with its client and auth state.
pub struct Session {
    pub profile_name: String,
    pub context: AuthContext<KeyringTokenStorage>,
}

/// Builds the client for the selected profile without touching the network.
pub fn load_session(global_profile: Option<&str>) -> Result<Session, CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(global_profile);
    let profile = config.profile(&profile_name).cloned().unwrap_or_default();
    let client_config = profile.client_config()?.ok_or_else(|| {
        CliError::Config(format!(
            "Profile '{profile_name}' has no API base URL. Run `notecard config init --api-base-url <URL>` or set PUBLIC_API_BASE_URL."
        ))
    })?;

    let context = AuthContext::new(client_config, KeyringTokenStorage::new(&profile_name))?;
    Ok(Session {
        profile_name,
        context,
    })
}

/// Loads the profile and restores its stored session, refreshing or clearing
/// expired tokens.
pub async fn open_session(global_profile: Option<&str>) -> Result<Session, CliError> {
    let session = load_session(global_profile)?;
    match session.context.initialize().await {
        Some(user) => tracing::debug!(user_id = %user.id, profile = %session.profile_name, "Session restored"),
        None => tracing::debug!(profile = %session.profile_name, "No active session"),
    }
    Ok(session)
}

/// Like [`open_session`], but fails unless a user is signed in.
pub async fn require_signed_in(global_profile: Option<&str>) -> Result<Session, CliError> {
    let session = open_session(global_profile).await?;
    if session.context.store().is_authenticated() {
        Ok(session)
    } else {
        Err(CliError::NotSignedIn(session.profile_name))
    }
}

#[derive(Debug, Serialize)]
pub struct NoteListItem {
    pub id: String,
    pub title: String,
    pub preview: String,
    pub tags: Vec<String>,
    pub is_public: bool,
    pub created_at: String,
    pub updated_at: String,
    pub time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_secondary: Option<String>,
}

pub fn note_to_list_item(
    note: &Note,
    formatter: &TimeFormatter,
    now: DateTime<Utc>,
) -> Result<NoteListItem, CliError> {
    let display = formatter.display_text(&note.created_at, &note.updated_at, now)?;
    Ok(NoteListItem {
        id: note.id.to_string(),
        title: note.title.clone(),
        preview: note.preview(80),
        tags: note.tags.clone(),
        is_public: note.is_public,
        created_at: note.created_at.clone(),
        updated_at: note.updated_at.clone(),
        time: display.primary,
        time_secondary: display.secondary,
    })
}

pub fn format_note_lines(
    notes: &[Note],
    formatter: &TimeFormatter,
    now: DateTime<Utc>,
) -> Result<Vec<String>, CliError> {
    notes
        .iter()
        .map(|note| -> Result<String, CliError> {
            let item = note_to_list_item(note, formatter, now)?;
            let short_id = item.id.chars().take(13).collect::<String>();
            let title = truncate(&item.title, 32);
            let time = match &item.time_secondary {
                Some(secondary) => format!("{} ({secondary})", item.time),
                None => item.time,
            };
            let tags = render_tags(&item.tags);

            Ok(if tags.is_empty() {
                format!("{short_id:<13}  {title:<32}  {time}")
            } else {
                format!("{short_id:<13}  {title:<32}  {time}  {tags}")
            })
        })
        .collect()
}

pub fn format_search_lines(items: &[SearchNotesItem]) -> Vec<String> {
    items
        .iter()
        .map(|item| {
            let short_id = item.note.id.as_str().chars().take(13).collect::<String>();
            format!(
                "{short_id:<13}  {:>5.2}  {}",
                item.similarity,
                truncate(&item.note.title, 48)
            )
        })
        .collect()
}

pub fn format_profile_lines(profile: &UserProfile) -> Vec<String> {
    let mut lines = vec![format!("{} ({})", profile.label(), profile.id)];
    if let Some(username) = &profile.username {
        lines.push(format!("username:     {username}"));
    }
    if let Some(display_name) = &profile.display_name {
        lines.push(format!("display name: {display_name}"));
    }
    if let Some(avatar_url) = &profile.avatar_url {
        lines.push(format!("avatar:       {avatar_url}"));
    }
    lines.push(format!("created:      {}", profile.created_at));
    lines
}

pub fn render_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|tag| format!("#{tag}"))
        .collect::<Vec<String>>()
        .join(" ")
}

fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        value.to_string()
    } else {
        let mut truncated = value
            .chars()
            .take(max_chars.saturating_sub(3))
            .collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn resolve_note_content(content_parts: &[String]) -> Result<String, CliError> {
    if let Some(content) = normalize_content(&content_parts.join(" ")) {
        return Ok(content);
    }

    if let Some(content) = read_piped_stdin()? {
        return Ok(content);
    }

    if let Some(content) = capture_editor_input_with_initial("")? {
        return Ok(content);
    }

    Err(CliError::EmptyContent)
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn normalize_search_query(query: &str) -> Result<String, CliError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptySearchQuery)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn normalize_note_id(id: &str) -> Result<NoteId, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyNoteId)
    } else {
        Ok(NoteId::from(trimmed))
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}

pub fn capture_editor_input_with_initial(
    initial_content: &str,
) -> Result<Option<String>, CliError> {
    let editor = preferred_editor();
    let temp_file = create_temp_note_file_path();
    std::fs::write(&temp_file, initial_content)?;

    let launch_result = launch_editor(&editor, &temp_file);
    let note_content = std::fs::read_to_string(&temp_file)?;
    let _ = std::fs::remove_file(&temp_file);

    launch_result?;
    Ok(normalize_content(&note_content))
}

pub fn launch_editor(editor: &str, file_path: &Path) -> Result<(), CliError> {
    match Command::new(editor).arg(file_path).status() {
        Ok(status) => {
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let mut parts = editor.split_whitespace();
            let Some(program) = parts.next() else {
                return Err(CliError::EditorFailed("empty EDITOR command".into()));
            };

            let mut command = Command::new(program);
            command.args(parts).arg(file_path);

            let status = command.status()?;
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) => Err(CliError::Io(err)),
    }
}

pub fn preferred_editor() -> String {
    env::var("VISUAL")
        .or_else(|_| env::var("EDITOR"))
        .unwrap_or_else(|_| default_editor().to_string())
}

pub const fn default_editor() -> &'static str {
    if cfg!(windows) {
        "notepad"
    } else {
        "vi"
    }
}

pub fn create_temp_note_file_path() -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    env::temp_dir().join(format!("notecard-note-{}-{now}.md", std::process::id()))
}
