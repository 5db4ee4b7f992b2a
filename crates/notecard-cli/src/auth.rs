//! Per-profile token storage in the OS keychain.

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::{Mutex, OnceLock};

#[cfg(not(test))]
use keyring::Entry;

use notecard_core::auth::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use notecard_core::{ApiError, ApiResult, TokenStorage};

#[cfg(not(test))]
const KEYRING_SERVICE_NAME: &str = "notecard-cli";

/// Access and refresh tokens for one CLI profile.
#[derive(Clone)]
pub struct KeyringTokenStorage {
    profile_name: String,
}

impl KeyringTokenStorage {
    pub fn new(profile_name: &str) -> Self {
        Self {
            profile_name: profile_name.to_string(),
        }
    }

    fn username(&self, key: &str) -> String {
        format!("{key}:{}", self.profile_name)
    }

    #[cfg(test)]
    fn test_store() -> &'static Mutex<HashMap<String, String>> {
        static STORE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
        STORE.get_or_init(|| Mutex::new(HashMap::new()))
    }

    #[cfg(not(test))]
    fn entry(&self, key: &str) -> ApiResult<Entry> {
        Entry::new(KEYRING_SERVICE_NAME, &self.username(key))
            .map_err(|error| ApiError::Storage(error.to_string()))
    }

    #[cfg(not(test))]
    fn read(&self, key: &str) -> ApiResult<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(ApiError::Storage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn read(&self, key: &str) -> ApiResult<Option<String>> {
        let guard = Self::test_store()
            .lock()
            .map_err(|error| ApiError::Storage(error.to_string()))?;
        Ok(guard.get(&self.username(key)).cloned())
    }

    #[cfg(not(test))]
    fn write(&self, key: &str, value: &str) -> ApiResult<()> {
        self.entry(key)?
            .set_password(value)
            .map_err(|error| ApiError::Storage(error.to_string()))
    }

    #[cfg(test)]
    fn write(&self, key: &str, value: &str) -> ApiResult<()> {
        let mut guard = Self::test_store()
            .lock()
            .map_err(|error| ApiError::Storage(error.to_string()))?;
        guard.insert(self.username(key), value.to_string());
        Ok(())
    }

    #[cfg(not(test))]
    fn remove(&self, key: &str) -> ApiResult<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(ApiError::Storage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn remove(&self, key: &str) -> ApiResult<()> {
        let mut guard = Self::test_store()
            .lock()
            .map_err(|error| ApiError::Storage(error.to_string()))?;
        guard.remove(&self.username(key));
        Ok(())
    }
}

impl TokenStorage for KeyringTokenStorage {
    fn access_token(&self) -> ApiResult<Option<String>> {
        self.read(ACCESS_TOKEN_KEY)
    }

    fn refresh_token(&self) -> ApiResult<Option<String>> {
        self.read(REFRESH_TOKEN_KEY)
    }

    fn store_access_token(&self, token: &str) -> ApiResult<()> {
        self.write(ACCESS_TOKEN_KEY, token)
    }

    fn store_refresh_token(&self, token: &str) -> ApiResult<()> {
        self.write(REFRESH_TOKEN_KEY, token)
    }

    fn clear(&self) -> ApiResult<()> {
        self.remove(ACCESS_TOKEN_KEY)?;
        self.remove(REFRESH_TOKEN_KEY)
    }
}

impl std::fmt::Debug for KeyringTokenStorage {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("KeyringTokenStorage")
            .field("profile_name", &self.profile_name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_scoped_per_profile() {
        let work = KeyringTokenStorage::new("auth-test-work");
        let home = KeyringTokenStorage::new("auth-test-home");

        work.store_tokens("work-access", Some("work-refresh")).unwrap();
        assert_eq!(work.access_token().unwrap().as_deref(), Some("work-access"));
        assert_eq!(work.refresh_token().unwrap().as_deref(), Some("work-refresh"));
        assert_eq!(home.access_token().unwrap(), None);

        work.clear().unwrap();
        assert_eq!(work.access_token().unwrap(), None);
        assert_eq!(work.refresh_token().unwrap(), None);
    }

    #[test]
    fn clear_without_tokens_is_ok() {
        KeyringTokenStorage::new("auth-test-empty").clear().unwrap();
    }

    #[test]
    fn debug_output_omits_tokens() {
        let storage = KeyringTokenStorage::new("auth-test-debug");
        storage.store_access_token("secret-access-token").unwrap();
        let rendered = format!("{storage:?}");
        assert!(!rendered.contains("secret-access-token"));
        assert!(rendered.contains("auth-test-debug"));
    }
}
