use chrono::Utc;
use notecard_core::format::{Locale, TimeFormatter};
use notecard_core::markdown::render_markdown;
use notecard_core::models::{NewNote, NoteUpdate, NotesPage};

use crate::cli::NotesCommands;
use crate::commands::common::{
    capture_editor_input_with_initial, format_note_lines, format_search_lines, load_session,
    normalize_note_id, normalize_search_query, note_to_list_item, require_signed_in,
    resolve_note_content, NoteListItem,
};
use crate::error::CliError;

pub async fn run_notes(
    command: NotesCommands,
    global_profile: Option<&str>,
    locale: Locale,
) -> Result<(), CliError> {
    let formatter = TimeFormatter::new(locale);
    match command {
        NotesCommands::List { page, json } => {
            let session = require_signed_in(global_profile).await?;
            let notes = session
                .context
                .client()
                .user_notes(page.limit, page.offset)
                .await?;
            print_page(&notes, &formatter, json)
        }
        NotesCommands::Public { page, json } => {
            let session = load_session(global_profile)?;
            let notes = session
                .context
                .client()
                .public_notes(page.limit, page.offset)
                .await?;
            print_page(&notes, &formatter, json)
        }
        NotesCommands::Get { id, html, json } => {
            let id = normalize_note_id(&id)?;
            let session = require_signed_in(global_profile).await?;
            let note = session.context.client().note(&id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&note)?);
            } else if html {
                println!("{}", render_markdown(&note.content));
            } else {
                let display = formatter.display_text(&note.created_at, &note.updated_at, Utc::now())?;
                println!("# {}", note.title);
                match display.secondary {
                    Some(secondary) => println!("{}  ({secondary})", display.primary),
                    None => println!("{}", display.primary),
                }
                println!();
                println!("{}", note.content);
            }
            Ok(())
        }
        NotesCommands::Create {
            title,
            tags,
            public,
            content,
        } => {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(CliError::EmptyTitle);
            }
            let content = resolve_note_content(&content)?;
            let session = require_signed_in(global_profile).await?;

            let mut new_note = NewNote::new(title, content);
            if !tags.is_empty() {
                new_note.tags = Some(tags);
            }
            if public {
                new_note.is_public = Some(true);
            }
            let note = session.context.client().create_note(&new_note).await?;
            println!("{}", note.id);
            Ok(())
        }
        NotesCommands::Update {
            id,
            title,
            content,
            tags,
            public,
            edit,
        } => {
            let id = normalize_note_id(&id)?;
            let session = require_signed_in(global_profile).await?;
            let client = session.context.client();

            let content = if edit {
                let current = client.note(&id).await?;
                capture_editor_input_with_initial(&current.content)?
                    .filter(|edited| *edited != current.content)
            } else {
                content
            };
            let update = NoteUpdate {
                title,
                content,
                tags,
                is_public: public,
            };
            if update.is_empty() {
                return Err(CliError::EmptyUpdate);
            }

            let note = client.update_note(&id, &update).await?;
            println!("Updated {}", note.id);
            Ok(())
        }
        NotesCommands::Delete { id } => {
            let id = normalize_note_id(&id)?;
            let session = require_signed_in(global_profile).await?;
            session.context.client().delete_note(&id).await?;
            println!("Deleted {id}");
            Ok(())
        }
        NotesCommands::Search {
            query,
            threshold,
            limit,
            json,
        } => {
            let query = normalize_search_query(&query)?;
            let session = require_signed_in(global_profile).await?;
            let results = session
                .context
                .client()
                .search_notes(&query, threshold, limit)
                .await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else if results.notes.is_empty() {
                println!("No matching notes.");
            } else {
                for line in format_search_lines(&results.notes) {
                    println!("{line}");
                }
            }
            Ok(())
        }
    }
}

fn print_page(page: &NotesPage, formatter: &TimeFormatter, as_json: bool) -> Result<(), CliError> {
    let now = Utc::now();
    if as_json {
        let items = page
            .notes
            .iter()
            .map(|note| note_to_list_item(note, formatter, now))
            .collect::<Result<Vec<NoteListItem>, CliError>>()?;
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if page.notes.is_empty() {
        println!("No notes.");
    } else {
        for line in format_note_lines(&page.notes, formatter, now)? {
            println!("{line}");
        }
    }
    Ok(())
}
