use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use redis::Client;
use redis::RedisError;

use super::SessionStore;
use super::SessionStoreError;

/// Redis-backed session store.
///
/// Keys are namespaced with a prefix; values are written with `SET .. EX`
/// so Redis expires sessions on its own.
#[derive(Clone)]
pub struct RedisSessionStore {
    connection: MultiplexedConnection,
    key_prefix: String,
}

impl RedisSessionStore {
    const MAX_CONNECT_ATTEMPTS: u32 = 3;
    const INITIAL_RETRY_DELAY_MS: u64 = 100;
    const MAX_RETRY_DELAY_MS: u64 = 5000;

    /// Connect to Redis, retrying with exponential backoff.
    ///
    /// # Arguments
    /// * `url` - Redis connection URL (`redis://host:port/db`)
    /// * `key_prefix` - Namespace prepended to every identity key
    ///
    /// # Errors
    /// * `OperationFailed` - URL cannot be parsed
    /// * `Unavailable` - No connection after all attempts
    pub async fn connect(
        url: &str,
        key_prefix: impl Into<String>,
    ) -> Result<Self, SessionStoreError> {
        let client = Client::open(url).map_err(|e| {
            tracing::error!(error = %e, "Invalid Redis URL");
            SessionStoreError::OperationFailed(format!("Invalid Redis URL: {}", e))
        })?;

        let connection = Self::connect_with_retry(&client).await?;
        tracing::info!(backend = "redis", "Session store connected");

        Ok(Self {
            connection,
            key_prefix: key_prefix.into(),
        })
    }

    async fn connect_with_retry(
        client: &Client,
    ) -> Result<MultiplexedConnection, SessionStoreError> {
        let mut attempts = 0;
        let mut delay = Self::INITIAL_RETRY_DELAY_MS;

        loop {
            attempts += 1;
            match client.get_multiplexed_async_connection().await {
                Ok(connection) => return Ok(connection),
                Err(e) if attempts < Self::MAX_CONNECT_ATTEMPTS => {
                    tracing::warn!(
                        attempt = attempts,
                        max_attempts = Self::MAX_CONNECT_ATTEMPTS,
                        retry_in_ms = delay,
                        error = %e,
                        "Redis connection failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    delay = (delay * 2).min(Self::MAX_RETRY_DELAY_MS);
                }
                Err(e) => {
                    tracing::error!(attempts, error = %e, "Redis connection failed");
                    return Err(SessionStoreError::Unavailable(e.to_string()));
                }
            }
        }
    }

    fn build_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

fn map_redis_error(operation: &'static str, err: RedisError) -> SessionStoreError {
    tracing::error!(operation, error = %err, "Redis operation failed");
    if err.is_io_error()
        || err.is_connection_dropped()
        || err.is_connection_refusal()
        || err.is_timeout()
    {
        SessionStoreError::Unavailable(err.to_string())
    } else {
        SessionStoreError::OperationFailed(err.to_string())
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), SessionStoreError> {
        let mut conn = self.connection.clone();
        // SETEX rejects a zero expiry
        let ttl_secs = ttl.as_secs().max(1);

        conn.set_ex::<_, _, ()>(self.build_key(key), value, ttl_secs)
            .await
            .map_err(|e| map_redis_error("SET", e))
    }

    async fn get(&self, key: &str) -> Result<Option<String>, SessionStoreError> {
        let mut conn = self.connection.clone();

        conn.get::<_, Option<String>>(self.build_key(key))
            .await
            .map_err(|e| map_redis_error("GET", e))
    }

    async fn delete(&self, key: &str) -> Result<(), SessionStoreError> {
        let mut conn = self.connection.clone();

        conn.del::<_, ()>(self.build_key(key))
            .await
            .map_err(|e| map_redis_error("DEL", e))
    }
}
