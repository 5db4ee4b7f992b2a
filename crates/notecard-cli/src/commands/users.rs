use notecard_core::models::ProfileInput;
use serde_json::{Map, Value};

use crate::cli::{ProfileArgs, ProfileCommands, UsersCommands};
use crate::commands::common::{format_profile_lines, load_session, require_signed_in};
use crate::error::CliError;

pub async fn run_users(command: UsersCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    let session = load_session(global_profile)?;
    let client = session.context.client();
    match command {
        UsersCommands::List { page, json } => {
            let users = client.list_users(page.limit, page.offset).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&users)?);
            } else {
                for profile in &users.users {
                    println!("{:<24}  {}", profile.username.as_deref().unwrap_or("-"), profile.label());
                }
            }
        }
        UsersCommands::Show { username } => {
            let profile = client.user_by_username(username.trim()).await?;
            for line in format_profile_lines(&profile) {
                println!("{line}");
            }
        }
    }
    Ok(())
}

pub async fn run_profile(command: ProfileCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    let session = require_signed_in(global_profile).await?;
    let client = session.context.client();
    let profile = match command {
        ProfileCommands::Show => client.user_profile().await?,
        ProfileCommands::Create { fields } => client.create_user_profile(&profile_input(fields)?).await?,
        ProfileCommands::Update { fields } => {
            let input = profile_input(fields)?;
            if input == ProfileInput::default() {
                return Err(CliError::EmptyUpdate);
            }
            client.update_user_profile(&input).await?
        }
        ProfileCommands::Delete => {
            client.delete_user_profile().await?;
            println!("Deleted profile for '{}'", session.profile_name);
            return Ok(());
        }
    };

    for line in format_profile_lines(&profile) {
        println!("{line}");
    }
    Ok(())
}

pub fn profile_input(fields: ProfileArgs) -> Result<ProfileInput, CliError> {
    let preferences = fields
        .preferences
        .as_deref()
        .map(serde_json::from_str::<Map<String, Value>>)
        .transpose()
        .map_err(|error| CliError::Config(format!("--preferences must be a JSON object: {error}")))?;

    Ok(ProfileInput {
        username: fields.username,
        display_name: fields.display_name,
        avatar_url: fields.avatar_url,
        preferences,
    })
}
