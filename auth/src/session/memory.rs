use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use tokio::sync::RwLock;

use super::SessionStore;
use super::SessionStoreError;
use crate::clock::Clock;
use crate::clock::SystemClock;

struct Entry {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Process-local session store.
///
/// Entries expire lazily: an entry past its TTL is treated as absent and
/// dropped on the next read of its key or the next write to the store.
pub struct InMemorySessionStore {
    entries: RwLock<HashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a store judging expiry against `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let now = self.clock.now();
        self.entries
            .read()
            .await
            .values()
            .filter(|entry| entry.expires_at > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), SessionStoreError> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| SessionStoreError::OperationFailed(format!("Invalid TTL: {}", e)))?;
        let now = self.clock.now();
        let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
            SessionStoreError::OperationFailed("TTL out of range".to_string())
        })?;

        let mut entries = self.entries.write().await;
        // Sweep on write so keys that are never read again do not accumulate
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, SessionStoreError> {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;

        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                tracing::debug!(key = %key, "Session entry expired");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), SessionStoreError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;

    use super::*;
    use crate::clock::ManualClock;

    const TTL: Duration = Duration::from_secs(60 * 60);

    #[tokio::test]
    async fn test_set_and_get() {
        let store = InMemorySessionStore::new();

        store.set("user@example.com", "token-1", TTL).await.unwrap();

        let value = store.get("user@example.com").await.unwrap();
        assert_eq!(value, Some("token-1".to_string()));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let store = InMemorySessionStore::new();

        store.set("user@example.com", "token-1", TTL).await.unwrap();
        store.set("user@example.com", "token-2", TTL).await.unwrap();

        let value = store.get("user@example.com").await.unwrap();
        assert_eq!(value, Some("token-2".to_string()));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let store = InMemorySessionStore::new();
        assert_eq!(store.get("nobody@example.com").await.unwrap(), None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = InMemorySessionStore::new();

        store.set("user@example.com", "token-1", TTL).await.unwrap();
        store.delete("user@example.com").await.unwrap();

        assert_eq!(store.get("user@example.com").await.unwrap(), None);
        // Deleting again is not an error
        assert!(store.delete("user@example.com").await.is_ok());
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let store = InMemorySessionStore::with_clock(clock.clone());

        store.set("user@example.com", "token-1", TTL).await.unwrap();

        clock.advance(ChronoDuration::minutes(59));
        assert!(store.get("user@example.com").await.unwrap().is_some());

        clock.advance(ChronoDuration::minutes(2));
        assert_eq!(store.get("user@example.com").await.unwrap(), None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_write_sweeps_expired_entries() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let store = InMemorySessionStore::with_clock(clock.clone());

        store.set("first@example.com", "token-1", TTL).await.unwrap();
        store.set("second@example.com", "token-2", TTL).await.unwrap();
        assert_eq!(store.entries.read().await.len(), 2);

        clock.advance(ChronoDuration::hours(2));
        store.set("third@example.com", "token-3", TTL).await.unwrap();

        let entries = store.entries.read().await;
        assert_eq!(entries.len(), 1);
        assert!(entries.contains_key("third@example.com"));
    }
}
