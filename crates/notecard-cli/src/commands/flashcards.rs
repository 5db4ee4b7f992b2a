use notecard_core::models::NoteId;
use notecard_core::{Flashcard, StreamHandle};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::cli::FlashcardCommands;
use crate::commands::common::{normalize_note_id, normalize_search_query, require_signed_in};
use crate::error::CliError;

pub async fn run_flashcards(
    command: FlashcardCommands,
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    let session = require_signed_in(global_profile).await?;
    let client = session.context.client();
    let (sender, receiver) = mpsc::unbounded_channel::<Value>();
    let forward = move |payload: Value| {
        let _ = sender.send(payload);
    };

    let (handle, as_json) = match command {
        FlashcardCommands::Query { query, json } => {
            let query = normalize_search_query(&query.join(" "))?;
            (client.stream_flashcards_from_query(&query, forward), json)
        }
        FlashcardCommands::Notes { ids, json } => {
            let ids = ids
                .iter()
                .map(|id| normalize_note_id(id))
                .collect::<Result<Vec<NoteId>, CliError>>()?;
            (client.stream_flashcards_from_notes(&ids, forward), json)
        }
    };

    print_stream(handle, receiver, as_json).await
}

async fn print_stream(
    handle: StreamHandle,
    mut receiver: mpsc::UnboundedReceiver<Value>,
    as_json: bool,
) -> Result<(), CliError> {
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut cards = 0_usize;
    loop {
        tokio::select! {
            payload = receiver.recv() => {
                let Some(payload) = payload else {
                    break;
                };
                if let Some(message) = stream_error(&payload) {
                    return Err(CliError::Stream(message));
                }
                if as_json {
                    println!("{payload}");
                } else if let Some(card) = Flashcard::from_payload(&payload) {
                    cards += 1;
                    println!("{}", format_flashcard(cards, &card));
                }
            }
            _ = &mut ctrl_c => {
                handle.abort();
                eprintln!("Cancelled after {cards} flashcard(s)");
                return Ok(());
            }
        }
    }

    if !as_json {
        eprintln!("{cards} flashcard(s) generated");
    }
    Ok(())
}

/// Message of a terminal `{"type": "error"}` payload.
pub fn stream_error(payload: &Value) -> Option<String> {
    if payload.get("type").and_then(Value::as_str) != Some("error") {
        return None;
    }
    Some(
        payload
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("stream error")
            .to_string(),
    )
}

pub fn format_flashcard(index: usize, card: &Flashcard) -> String {
    let mut lines = vec![
        format!("[{index}] Q: {}", card.question),
        format!("    A: {}", card.answer),
    ];
    if let Some(explanation) = &card.explanation {
        lines.push(format!("    Why: {explanation}"));
    }
    let mut meta = Vec::new();
    if let Some(difficulty) = &card.difficulty {
        meta.push(difficulty.clone());
    }
    if let Some(tags) = card.tags.as_ref().filter(|tags| !tags.is_empty()) {
        meta.push(tags.iter().map(|tag| format!("#{tag}")).collect::<Vec<_>>().join(" "));
    }
    if !meta.is_empty() {
        lines.push(format!("    ({})", meta.join(", ")));
    }
    lines.push(String::new());
    lines.join("\n")
}
