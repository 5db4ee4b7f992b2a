//! Session lifecycle: startup restore, logout and periodic token checks.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::jwt::is_token_expired;
use super::{AuthStore, TokenStorage};
use crate::api::ApiClient;
use crate::config::{ClientConfig, TOKEN_VALIDATION_INTERVAL};
use crate::error::ApiResult;
use crate::models::User;
use crate::util::unix_timestamp_now;

/// Owns the API client and the auth store for one front end.
///
/// Construct one per application and hand clones to whatever renders the
/// current user.
#[derive(Clone)]
pub struct AuthContext<S: TokenStorage> {
    client: ApiClient<S>,
}

impl<S: TokenStorage> AuthContext<S> {
    pub fn new(config: ClientConfig, storage: S) -> ApiResult<Self> {
        let store = Arc::new(AuthStore::new());
        let client = ApiClient::new(config, storage, store)?;
        Ok(Self { client })
    }

    pub const fn from_client(client: ApiClient<S>) -> Self {
        Self { client }
    }

    pub const fn client(&self) -> &ApiClient<S> {
        &self.client
    }

    pub fn store(&self) -> &Arc<AuthStore> {
        self.client.store()
    }

    /// Restores a stored session.
    ///
    /// An expired access token is refreshed first. The session is then
    /// confirmed against `/auth/user`; on success the user is adopted and the
    /// profile is published. Any failure logs out.
    pub async fn initialize(&self) -> Option<User> {
        let Some(token) = self.stored_access_token() else {
            tracing::debug!("No stored access token, starting anonymous");
            return None;
        };

        if is_token_expired(&token, unix_timestamp_now()) {
            tracing::info!("Token expired during initialization, attempting refresh");
            if !self.client.refresh_token().await {
                tracing::info!("Refresh failed, logging out");
                self.logout();
                return None;
            }
        }

        match self.client.current_user().await {
            Ok(current) => {
                let store = self.store();
                store.set_user(Some(current.user.clone()));
                store.publish_profile_loaded(current.profile);
                Some(current.user)
            }
            Err(error) => {
                tracing::info!(%error, "Token validation failed, logging out");
                self.logout();
                None
            }
        }
    }

    /// Clears both tokens, then marks the store anonymous.
    pub fn logout(&self) {
        if let Err(error) = self.client.storage().clear() {
            tracing::warn!(%error, "Failed to clear stored tokens");
        }
        self.store().set_user(None);
    }

    /// Starts the periodic expiry check at the default interval.
    pub fn start_token_validation(&self) -> TokenValidationTimer {
        self.start_token_validation_every(TOKEN_VALIDATION_INTERVAL)
    }

    /// Checks the access token every `period` while a user is signed in.
    ///
    /// The first check runs one period after this call. An expired token is
    /// refreshed; a failed refresh logs out.
    pub fn start_token_validation_every(&self, period: Duration) -> TokenValidationTimer {
        let context = self.clone();
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                context.validate_token().await;
            }
        });
        tracing::debug!(period_secs = period.as_secs(), "Token validation timer started");
        TokenValidationTimer { task }
    }

    async fn validate_token(&self) {
        if !self.store().is_authenticated() {
            return;
        }
        let Some(token) = self.stored_access_token() else {
            return;
        };
        if !is_token_expired(&token, unix_timestamp_now()) {
            return;
        }

        tracing::info!("Token expired during validation check, attempting refresh");
        if self.client.refresh_token().await {
            tracing::info!("Token refreshed during periodic check");
        } else {
            tracing::info!("Periodic refresh failed, logging out");
            self.logout();
        }
    }

    fn stored_access_token(&self) -> Option<String> {
        self.client.storage().access_token().unwrap_or_else(|error| {
            tracing::warn!(%error, "Failed to read access token");
            None
        })
    }
}

/// Running token validation task. Stops on [`stop`](Self::stop) or drop.
#[derive(Debug)]
pub struct TokenValidationTimer {
    task: JoinHandle<()>,
}

impl TokenValidationTimer {
    pub fn stop(&self) {
        self.task.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for TokenValidationTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
