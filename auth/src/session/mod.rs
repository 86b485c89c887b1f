pub mod errors;
pub mod memory;
pub mod redis_store;

use std::time::Duration;

use async_trait::async_trait;

pub use errors::SessionStoreError;
pub use memory::InMemorySessionStore;
pub use redis_store::RedisSessionStore;

/// Key-value store holding the current refresh token of each identity.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Arguments
    /// * `key` - Identity
    /// * `value` - Refresh token
    /// * `ttl` - Time until the entry expires
    ///
    /// # Errors
    /// * `Unavailable` - Store cannot be reached
    /// * `OperationFailed` - Store rejected the write
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), SessionStoreError>;

    /// Retrieve the live value stored under `key`.
    ///
    /// # Returns
    /// Optional value (None if absent or expired)
    ///
    /// # Errors
    /// * `Unavailable` - Store cannot be reached
    /// * `OperationFailed` - Store rejected the read
    async fn get(&self, key: &str) -> Result<Option<String>, SessionStoreError>;

    /// Remove the value stored under `key`. Removing an absent key succeeds.
    ///
    /// # Errors
    /// * `Unavailable` - Store cannot be reached
    /// * `OperationFailed` - Store rejected the delete
    async fn delete(&self, key: &str) -> Result<(), SessionStoreError>;
}
