use notecard_core::auth::jwt::{token_expiry, TokenExpiry};
use notecard_core::TokenStorage;

use crate::cli::AuthCommands;
use crate::commands::common::{load_session, open_session};
use crate::error::CliError;

pub async fn run_auth(command: AuthCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        AuthCommands::Login { redirect_url } => {
            let session = load_session(global_profile)?;
            let response = session
                .context
                .client()
                .initiate_google_login(redirect_url.as_deref())
                .await?;
            if !response.message.is_empty() {
                println!("{}", response.message);
            }
            println!("Open this URL to sign in:\n{}", response.url);
            println!(
                "Then run `notecard auth token --access-token <token> --refresh-token <token>` with the tokens from the redirect."
            );
            Ok(())
        }
        AuthCommands::Token {
            access_token,
            refresh_token,
        } => {
            let access_token = access_token.trim();
            if access_token.is_empty() {
                return Err(CliError::Auth("Access token must not be empty".to_string()));
            }
            let refresh_token = refresh_token
                .as_deref()
                .map(str::trim)
                .filter(|token| !token.is_empty());

            let session = load_session(global_profile)?;
            session
                .context
                .client()
                .storage()
                .store_tokens(access_token, refresh_token)?;

            match session.context.initialize().await {
                Some(user) => {
                    println!("Signed in profile '{}' as {}", session.profile_name, user.email);
                    Ok(())
                }
                None => Err(CliError::Auth(
                    "The server rejected the provided tokens".to_string(),
                )),
            }
        }
        AuthCommands::Status => {
            let session = open_session(global_profile).await?;
            let Some(user) = session.context.store().user() else {
                println!("Profile '{}' is not signed in.", session.profile_name);
                return Ok(());
            };

            let expiry = session
                .context
                .client()
                .storage()
                .access_token()?
                .map_or(TokenExpiry::Malformed, |token| token_expiry(&token));
            let expiry_label = match expiry {
                TokenExpiry::ExpiresAt(exp) => chrono::DateTime::from_timestamp(exp, 0)
                    .map_or_else(|| exp.to_string(), |at| at.to_rfc3339()),
                TokenExpiry::NoExpiry => "never".to_string(),
                TokenExpiry::Malformed => "unknown".to_string(),
            };
            println!(
                "Profile '{}' is signed in as {} (expires_at={})",
                session.profile_name, user.email, expiry_label
            );
            Ok(())
        }
        AuthCommands::Logout => {
            let session = load_session(global_profile)?;
            let has_token = session.context.client().storage().access_token()?.is_some();
            if has_token {
                if let Err(error) = session.context.client().logout().await {
                    tracing::warn!(%error, "Server logout failed; clearing local tokens anyway");
                }
            }
            session.context.logout();
            println!("Signed out profile '{}'", session.profile_name);
            Ok(())
        }
    }
}
