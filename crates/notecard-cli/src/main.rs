//! Notecard CLI - notes, semantic search and flashcards from the terminal
//!
//! Each profile points at one Notecard API and keeps its tokens in the OS
//! keychain.

mod auth;
mod cli;
mod commands;
mod config_profiles;
mod error;


use clap::Parser;
use tracing_subscriber::filter::Directive;

use crate::cli::{Cli, Commands};
use crate::commands::auth_cmd::run_auth;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::flashcards::run_flashcards;
use crate::commands::health::run_health;
use crate::commands::notes::run_notes;
use crate::commands::users::{run_profile, run_users};
use crate::error::CliError;

const DEFAULT_LOG_DIRECTIVE: &str = "notecard=info";

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = DEFAULT_LOG_DIRECTIVE.parse::<Directive>() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let profile = cli.profile.as_deref();

    match cli.command {
        Commands::Config { command } => run_config(command, profile)?,
        Commands::Auth { command } => run_auth(command, profile).await?,
        Commands::Health => run_health(profile).await?,
        Commands::Notes { command } => run_notes(command, profile, cli.locale).await?,
        Commands::Users { command } => run_users(command, profile).await?,
        Commands::Profile { command } => run_profile(command, profile).await?,
        Commands::Flashcards { command } => run_flashcards(command, profile).await?,
        Commands::Completions { shell, output } => {
            run_completions(shell, output.as_deref())?;
        }
    }

    Ok(())
}
