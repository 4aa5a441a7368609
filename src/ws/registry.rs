//! Live WebSocket connection registry with explicit lifecycle.
//!
//! An injected service (held in [`crate::app_state::AppState`]), never a
//! module-level singleton: every connection registers on connect and
//! deregisters on close. The registry answers presence queries and tells
//! the connection loop whether a register/deregister was the user's
//! first/last live session, which drives the online/offline events.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::domain::UserId;

/// Tracks how many live sessions each user currently has.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    sessions: RwLock<HashMap<UserId, usize>>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new session. Returns `true` if this is the user's
    /// first live session (the user just came online).
    pub async fn register(&self, user_id: UserId) -> bool {
        let mut map = self.sessions.write().await;
        let count = map.entry(user_id).or_insert(0);
        *count += 1;
        *count == 1
    }

    /// Deregisters a session. Returns `true` if this was the user's last
    /// live session (the user just went offline).
    pub async fn deregister(&self, user_id: UserId) -> bool {
        let mut map = self.sessions.write().await;
        match map.get_mut(&user_id) {
            Some(count) if *count > 1 => {
                *count -= 1;
                false
            }
            Some(_) => {
                map.remove(&user_id);
                true
            }
            None => false,
        }
    }

    /// Returns `true` if the user has at least one live session.
    pub async fn is_online(&self, user_id: UserId) -> bool {
        self.sessions.read().await.contains_key(&user_id)
    }

    /// Returns the number of distinct online users.
    pub async fn online_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_register_reports_online() {
        let registry = ConnectionRegistry::new();
        let user = UserId::new();

        assert!(registry.register(user).await);
        assert!(registry.is_online(user).await);
        // Second session for the same user is not a presence change.
        assert!(!registry.register(user).await);
    }

    #[tokio::test]
    async fn last_deregister_reports_offline() {
        let registry = ConnectionRegistry::new();
        let user = UserId::new();

        let _ = registry.register(user).await;
        let _ = registry.register(user).await;

        assert!(!registry.deregister(user).await);
        assert!(registry.is_online(user).await);
        assert!(registry.deregister(user).await);
        assert!(!registry.is_online(user).await);
    }

    #[tokio::test]
    async fn deregister_without_register_is_harmless() {
        let registry = ConnectionRegistry::new();
        assert!(!registry.deregister(UserId::new()).await);
        assert_eq!(registry.online_count().await, 0);
    }

    #[tokio::test]
    async fn online_count_tracks_distinct_users() {
        let registry = ConnectionRegistry::new();
        let a = UserId::new();
        let b = UserId::new();

        let _ = registry.register(a).await;
        let _ = registry.register(a).await;
        let _ = registry.register(b).await;
        assert_eq!(registry.online_count().await, 2);
    }
}
