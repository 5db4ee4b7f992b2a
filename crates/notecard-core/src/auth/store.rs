//! Authentication state shared by everything that renders the current user.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use tokio::sync::broadcast;

use crate::models::{User, UserProfile};

/// Capacity of the profile-loaded channel. Slow listeners lag, they never block.
const PROFILE_EVENT_CAPACITY: usize = 16;

type Listener = Arc<dyn Fn(Option<&User>) + Send + Sync>;

/// Handle returned by [`AuthStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Holds the single current user and tells observers when it changes.
///
/// There are two states: authenticated (`Some(user)`) and anonymous (`None`).
/// Setting the user to `None` is the only logout signal.
pub struct AuthStore {
    user: RwLock<Option<User>>,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    next_listener_id: AtomicU64,
    profile_events: broadcast::Sender<UserProfile>,
}

impl AuthStore {
    pub fn new() -> Self {
        let (profile_events, _) = broadcast::channel(PROFILE_EVENT_CAPACITY);
        Self {
            user: RwLock::new(None),
            listeners: Mutex::new(Vec::new()),
            next_listener_id: AtomicU64::new(1),
            profile_events,
        }
    }

    /// Registers a callback invoked with the new user on every [`set_user`](Self::set_user).
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(Option<&User>) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_listener_id.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push((id, Arc::new(listener)));
        }
        id
    }

    /// Removes a callback. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let Ok(mut listeners) = self.listeners.lock() else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    /// Replaces the current user and notifies every listener synchronously.
    pub fn set_user(&self, user: Option<User>) {
        match &user {
            Some(user) => tracing::info!(user_id = %user.id, "Auth state: authenticated"),
            None => tracing::info!("Auth state: anonymous"),
        }

        if let Ok(mut current) = self.user.write() {
            *current = user.clone();
        }

        // Snapshot so listeners may subscribe/unsubscribe from inside the callback.
        let listeners = self
            .listeners
            .lock()
            .map(|listeners| {
                listeners
                    .iter()
                    .map(|(_, listener)| Arc::clone(listener))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        for listener in listeners {
            listener(user.as_ref());
        }
    }

    /// The current user, if any.
    pub fn user(&self) -> Option<User> {
        self.user.read().ok().and_then(|user| user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.read().is_ok_and(|user| user.is_some())
    }

    /// Receives every profile published after this call.
    pub fn subscribe_profile_loaded(&self) -> broadcast::Receiver<UserProfile> {
        self.profile_events.subscribe()
    }

    /// Announces a freshly loaded profile to decoupled listeners.
    ///
    /// Dropped silently when nobody is listening.
    pub fn publish_profile_loaded(&self, profile: UserProfile) {
        match self.profile_events.send(profile) {
            Ok(receivers) => tracing::debug!(receivers, "Profile loaded event published"),
            Err(_) => tracing::debug!("Profile loaded event dropped (no listeners)"),
        }
    }
}

impl Default for AuthStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AuthStore {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listener_count = self.listeners.lock().map_or(0, |listeners| listeners.len());
        formatter
            .debug_struct("AuthStore")
            .field("user", &self.user())
            .field("listeners", &listener_count)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use pretty_assertions::assert_eq;

    use super::*;

    fn user(id: &str) -> User {
        User {
            id: id.to_string(),
            email: format!("{id}@example.com"),
            metadata: None,
        }
    }

    #[test]
    fn set_user_notifies_listeners_with_new_value() {
        let store = AuthStore::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        store.subscribe(move |user| {
            sink.lock()
                .unwrap()
                .push(user.map(|user| user.id.clone()));
        });

        store.set_user(Some(user("a")));
        store.set_user(None);

        assert_eq!(*seen.lock().unwrap(), vec![Some("a".to_string()), None]);
        assert!(!store.is_authenticated());
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let store = AuthStore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let id = store.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        store.set_user(Some(user("a")));
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.set_user(None);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn listener_may_read_store_during_notification() {
        let store = Arc::new(AuthStore::new());
        let observed = Arc::new(Mutex::new(None));
        let inner_store = Arc::clone(&store);
        let sink = Arc::clone(&observed);
        store.subscribe(move |_| {
            *sink.lock().unwrap() = Some(inner_store.is_authenticated());
        });

        store.set_user(Some(user("a")));
        assert_eq!(*observed.lock().unwrap(), Some(true));
        assert_eq!(store.user().map(|user| user.id), Some("a".to_string()));
    }

    #[test]
    fn profile_loaded_reaches_subscribers() {
        let store = AuthStore::new();
        let mut receiver = store.subscribe_profile_loaded();
        let profile = UserProfile {
            id: "a".to_string(),
            username: Some("ada".to_string()),
            display_name: None,
            avatar_url: None,
            preferences: None,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
        };

        store.publish_profile_loaded(profile.clone());
        assert_eq!(receiver.try_recv().unwrap(), profile);
    }
}
