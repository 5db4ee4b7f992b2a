//! Client configuration.
//!
//! Provides the `ClientConfig` struct used by every front end to locate the
//! Notecard API and the page the OAuth flow should return to.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::util::{normalize_base_url, normalize_text_option};

/// Environment variable holding the API base URL.
pub const API_BASE_URL_ENV: &str = "PUBLIC_API_BASE_URL";
/// Environment variable holding the frontend redirect URL.
pub const FRONTEND_URL_ENV: &str = "PUBLIC_FRONTEND_URL";

/// How often an active session re-checks its access token expiry.
pub const TOKEN_VALIDATION_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Endpoints the client talks to.
///
/// Both values are public URLs; credentials never live here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub frontend_url: String,
}

impl ClientConfig {
    /// Builds a validated config.
    ///
    /// When `frontend_url` is `None` the API base URL doubles as the OAuth
    /// redirect target.
    pub fn new(api_base_url: impl AsRef<str>, frontend_url: Option<String>) -> ApiResult<Self> {
        let api_base_url = normalize_base_url(api_base_url.as_ref(), "API base URL")
            .map_err(ApiError::InvalidConfiguration)?;
        let frontend_url = match normalize_text_option(frontend_url) {
            Some(url) => normalize_base_url(&url, "Frontend URL")
                .map_err(ApiError::InvalidConfiguration)?,
            None => api_base_url.clone(),
        };
        Ok(Self {
            api_base_url,
            frontend_url,
        })
    }

    /// Reads `PUBLIC_API_BASE_URL` and `PUBLIC_FRONTEND_URL`.
    ///
    /// Returns `Ok(None)` when no API base URL is configured.
    pub fn from_env() -> ApiResult<Option<Self>> {
        Self::from_values(
            std::env::var(API_BASE_URL_ENV).ok(),
            std::env::var(FRONTEND_URL_ENV).ok(),
        )
    }

    /// Resolves a config from optional raw values (env, profile file, flags).
    pub fn from_values(
        api_base_url: Option<String>,
        frontend_url: Option<String>,
    ) -> ApiResult<Option<Self>> {
        let Some(api_base_url) = normalize_text_option(api_base_url) else {
            return Ok(None);
        };
        Self::new(api_base_url, frontend_url).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn new_normalizes_both_urls() {
        let config = ClientConfig::new(
            " https://api.example.com/ ",
            Some("https://app.example.com/".to_string()),
        )
        .unwrap();
        assert_eq!(
            config,
            ClientConfig {
                api_base_url: "https://api.example.com".to_string(),
                frontend_url: "https://app.example.com".to_string(),
            }
        );
    }

    #[test]
    fn frontend_url_defaults_to_api_base() {
        let config = ClientConfig::new("http://localhost:8080", None).unwrap();
        assert_eq!(config.frontend_url, "http://localhost:8080");
    }

    #[test]
    fn rejects_url_without_scheme() {
        let error = ClientConfig::new("api.example.com", None).unwrap_err();
        assert!(matches!(error, ApiError::InvalidConfiguration(_)));
    }

    #[test]
    fn from_values_returns_none_when_base_missing() {
        assert!(ClientConfig::from_values(None, None).unwrap().is_none());
        assert!(ClientConfig::from_values(Some("  ".to_string()), None)
            .unwrap()
            .is_none());
    }

    #[test]
    fn from_env_reads_public_urls() {
        std::env::set_var(API_BASE_URL_ENV, "https://api.example.com/");
        std::env::set_var(FRONTEND_URL_ENV, " https://app.example.com/ ");
        let config = ClientConfig::from_env().unwrap();

        std::env::remove_var(API_BASE_URL_ENV);
        std::env::remove_var(FRONTEND_URL_ENV);
        let unset = ClientConfig::from_env().unwrap();

        assert_eq!(
            config,
            Some(ClientConfig {
                api_base_url: "https://api.example.com".to_string(),
                frontend_url: "https://app.example.com".to_string(),
            })
        );
        assert_eq!(unset, None);
    }
}
