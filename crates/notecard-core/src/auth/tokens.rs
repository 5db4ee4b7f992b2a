//! Token persistence.

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::error::{ApiError, ApiResult};

/// Storage key for the access token.
pub const ACCESS_TOKEN_KEY: &str = "access_token";
/// Storage key for the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Where the client keeps its access and refresh tokens.
///
/// Implementations are shared by every clone of the client, so writes made
/// through one handle are visible to all of them. Last write wins.
pub trait TokenStorage: Clone + Send + Sync + 'static {
    fn access_token(&self) -> ApiResult<Option<String>>;
    fn refresh_token(&self) -> ApiResult<Option<String>>;
    fn store_access_token(&self, token: &str) -> ApiResult<()>;
    fn store_refresh_token(&self, token: &str) -> ApiResult<()>;
    /// Removes both tokens.
    fn clear(&self) -> ApiResult<()>;

    /// Stores a freshly issued pair; the refresh token is only replaced when
    /// the server rotated it.
    fn store_tokens(&self, access_token: &str, refresh_token: Option<&str>) -> ApiResult<()> {
        self.store_access_token(access_token)?;
        if let Some(refresh_token) = refresh_token {
            self.store_refresh_token(refresh_token)?;
        }
        Ok(())
    }
}

#[derive(Clone, Default, PartialEq, Eq)]
struct TokenPair {
    access: Option<String>,
    refresh: Option<String>,
}

/// Process-local token storage.
#[derive(Clone, Default)]
pub struct MemoryTokenStorage {
    inner: Arc<Mutex<TokenPair>>,
}

impl MemoryTokenStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with a session.
    #[must_use]
    pub fn with_tokens(access_token: Option<&str>, refresh_token: Option<&str>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(TokenPair {
                access: access_token.map(ToString::to_string),
                refresh: refresh_token.map(ToString::to_string),
            })),
        }
    }

    fn with_pair<T>(&self, f: impl FnOnce(&mut TokenPair) -> T) -> ApiResult<T> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|error| ApiError::Storage(error.to_string()))?;
        Ok(f(&mut *guard))
    }
}

impl fmt::Debug for MemoryTokenStorage {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("MemoryTokenStorage")
            .field(ACCESS_TOKEN_KEY, &"[REDACTED]")
            .field(REFRESH_TOKEN_KEY, &"[REDACTED]")
            .finish()
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn access_token(&self) -> ApiResult<Option<String>> {
        self.with_pair(|pair| pair.access.clone())
    }

    fn refresh_token(&self) -> ApiResult<Option<String>> {
        self.with_pair(|pair| pair.refresh.clone())
    }

    fn store_access_token(&self, token: &str) -> ApiResult<()> {
        self.with_pair(|pair| pair.access = Some(token.to_string()))
    }

    fn store_refresh_token(&self, token: &str) -> ApiResult<()> {
        self.with_pair(|pair| pair.refresh = Some(token.to_string()))
    }

    fn clear(&self) -> ApiResult<()> {
        self.with_pair(|pair| *pair = TokenPair::default())
    }
}
