//! Health and session endpoints.

use reqwest::Method;
use serde_json::{json, Value};

use super::ApiClient;
use crate::auth::TokenStorage;
use crate::error::ApiResult;
use crate::models::{CurrentUser, Empty, OAuthResponse};

impl<S: TokenStorage> ApiClient<S> {
    pub async fn health_check(&self) -> ApiResult<Value> {
        self.request(Method::GET, "/health", None).await
    }

    /// Starts the Google OAuth flow and returns the URL to open.
    ///
    /// The server redirects back to `redirect_url`, or to the configured
    /// frontend URL when none is given.
    pub async fn initiate_google_login(&self, redirect_url: Option<&str>) -> ApiResult<OAuthResponse> {
        let redirect_url = redirect_url.unwrap_or(&self.config().frontend_url);
        self.request(
            Method::POST,
            "/auth/google/login",
            Some(json!({ "redirect_url": redirect_url })),
        )
        .await
    }

    pub async fn current_user(&self) -> ApiResult<CurrentUser> {
        self.request(Method::GET, "/auth/user", None).await
    }

    /// Ends the server-side session. Local tokens are left to the caller.
    pub async fn logout(&self) -> ApiResult<Empty> {
        self.request(Method::POST, "/auth/logout", None).await
    }
}
