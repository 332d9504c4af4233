/// Redis cache wrapper with graceful degradation.
///
/// Every public operation swallows Redis failures: reads return `None`, writes
/// return `false`, and a warning is logged. Callers fall through to the data
/// store, so the server is fully functional without Redis.
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::warn;

use crate::error::CommonError;

pub struct RedisCache {
    client: Option<redis::Client>,
}

impl RedisCache {
    /// A `None` URL (or one that fails to parse) yields a cache that no-ops.
    pub fn new(url: Option<&str>) -> Self {
        let client = url.and_then(|u| {
            redis::Client::open(u)
                .inspect_err(|e| {
                    warn!(error = %e, url = u, "failed to create redis client, cache disabled")
                })
                .ok()
        });
        Self { client }
    }

    /// Sends a PING. Returns `true` if Redis answered.
    pub async fn is_available(&self) -> bool {
        let Ok(mut conn) = self.connection().await else {
            return false;
        };
        let pong: Result<String, _> = redis::cmd("PING").query_async(&mut conn).await;
        pong.is_ok()
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let mut conn = self.logged_connection().await?;
        let value: Option<String> = conn
            .get(key)
            .await
            .inspect_err(|e| warn!(error = %e, key, "redis GET failed"))
            .ok()?;
        value
    }

    pub async fn set_with_ttl(&self, key: &str, value: &str, ttl_secs: u64) -> bool {
        let Some(mut conn) = self.logged_connection().await else {
            return false;
        };
        conn.set_ex::<_, _, ()>(key, value, ttl_secs)
            .await
            .inspect_err(|e| warn!(error = %e, key, "redis SETEX failed"))
            .is_ok()
    }

    async fn connection(&self) -> Result<MultiplexedConnection, CommonError> {
        let client = self.client.as_ref().ok_or(CommonError::RedisUnavailable)?;
        Ok(client.get_multiplexed_async_connection().await?)
    }

    async fn logged_connection(&self) -> Option<MultiplexedConnection> {
        match self.connection().await {
            Ok(conn) => Some(conn),
            Err(CommonError::RedisUnavailable) => None,
            Err(e) => {
                warn!(error = %e, "redis connection failed");
                None
            }
        }
    }
}
