//! Server-side deduplication of client-supplied idempotency keys.
//!
//! Mutating trade operations accept an optional idempotency key. A key
//! seen within the configured window marks the request as a replay: the
//! operation returns the current state unchanged instead of appending a
//! second history entry. Keys are recorded only after the operation
//! succeeds, so a failed request can be retried with the same key.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

/// Time-windowed idempotency key cache.
#[derive(Debug)]
pub struct IdempotencyCache {
    window: Duration,
    seen: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl IdempotencyCache {
    /// Creates a cache with the given deduplication window in seconds.
    #[must_use]
    pub fn new(window_secs: u64) -> Self {
        Self {
            window: Duration::seconds(i64::try_from(window_secs).unwrap_or(i64::MAX)),
            seen: RwLock::new(HashMap::new()),
        }
    }

    /// Returns `true` if `key` was recorded within the window.
    ///
    /// Expired keys are pruned opportunistically on the way.
    pub async fn is_replay(&self, key: &str) -> bool {
        let now = Utc::now();
        let mut map = self.seen.write().await;
        map.retain(|_, recorded| now - *recorded < self.window);
        map.contains_key(key)
    }

    /// Records a key after the guarded operation succeeded.
    pub async fn record(&self, key: String) {
        self.seen.write().await.insert(key, Utc::now());
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unseen_key_is_not_a_replay() {
        let cache = IdempotencyCache::new(300);
        assert!(!cache.is_replay("counter:abc").await);
    }

    #[tokio::test]
    async fn recorded_key_is_a_replay() {
        let cache = IdempotencyCache::new(300);
        cache.record("counter:abc".to_string()).await;
        assert!(cache.is_replay("counter:abc").await);
        assert!(!cache.is_replay("counter:def").await);
    }

    #[tokio::test]
    async fn expired_key_is_pruned() {
        let cache = IdempotencyCache::new(0);
        cache.record("accept:xyz".to_string()).await;
        // Zero-second window: the key is expired by the time it is checked.
        assert!(!cache.is_replay("accept:xyz").await);
    }
}
