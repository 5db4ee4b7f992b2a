use notecard_core::util::normalize_base_url;

use crate::cli::ConfigCommands;
use crate::config_profiles::{normalize_text_option, CliProfile, CliProfilesConfig};
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            api_base_url,
            frontend_url,
            no_activate,
        } => run_config_init(global_profile, api_base_url, frontend_url, no_activate),
        ConfigCommands::Show => run_config_show(global_profile),
    }
}

pub fn run_config_init(
    profile_name: Option<&str>,
    api_base_url: Option<String>,
    frontend_url: Option<String>,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = apply_profile_init(&mut config, profile_name, api_base_url, frontend_url, no_activate)?;

    let path = config.save().map_err(CliError::Config)?;
    println!(
        "Profile '{}' initialized at {}",
        profile_name,
        path.display()
    );

    let has_api_base_url = config
        .profile(&profile_name)
        .and_then(|profile| profile.api_base_url.as_ref())
        .is_some();
    if has_api_base_url {
        println!("Run `notecard auth login` to sign in.");
    } else {
        println!(
            "Profile '{profile_name}' is missing: api_base_url (PUBLIC_API_BASE_URL will be used if set)"
        );
    }

    Ok(())
}

/// Merges explicit values into the named profile and returns its name.
pub fn apply_profile_init(
    config: &mut CliProfilesConfig,
    profile_name: Option<&str>,
    api_base_url: Option<String>,
    frontend_url: Option<String>,
    no_activate: bool,
) -> Result<String, CliError> {
    let profile_name = config.resolve_profile_name(profile_name);

    let profile = config.profile_mut_or_default(&profile_name);
    if let Some(value) = normalize_text_option(api_base_url) {
        profile.api_base_url = Some(value);
    }
    if let Some(value) = normalize_text_option(frontend_url) {
        profile.frontend_url = Some(value);
    }
    validate_profile_urls(profile)?;

    if !no_activate {
        config.active_profile = Some(profile_name.clone());
    }
    Ok(profile_name)
}

fn run_config_show(global_profile: Option<&str>) -> Result<(), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(global_profile);
    let profile = config.profile(&profile_name).cloned().unwrap_or_default();
    let resolved = profile.client_config()?;

    println!("profile:      {profile_name}");
    match resolved {
        Some(client_config) => {
            println!("api_base_url: {}", client_config.api_base_url);
            println!("frontend_url: {}", client_config.frontend_url);
        }
        None => println!("api_base_url: (not set)"),
    }
    Ok(())
}

fn validate_profile_urls(profile: &mut CliProfile) -> Result<(), CliError> {
    if let Some(url) = profile.api_base_url.take() {
        profile.api_base_url = Some(normalize_base_url(&url, "api_base_url").map_err(CliError::Config)?);
    }
    if let Some(url) = profile.frontend_url.take() {
        profile.frontend_url = Some(normalize_base_url(&url, "frontend_url").map_err(CliError::Config)?);
    }
    Ok(())
}
