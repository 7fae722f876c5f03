use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client as RedisClient, RedisResult};
use tokio::sync::OnceCell;
use tracing::info;

/// Read-through cache for serialized job criteria, keyed by job id.
///
/// The cache is never a source of truth: callers treat every error as a miss.
#[async_trait]
pub trait JobCache: Send + Sync {
    /// Returns the cached payload, or `None` on a miss.
    async fn get(&self, job_id: i64) -> RedisResult<Option<String>>;

    /// Stores a payload that expires after `ttl`.
    async fn set(&self, job_id: i64, payload: String, ttl: Duration) -> RedisResult<()>;
}

pub fn cache_key(job_id: i64) -> String {
    format!("job:{job_id}")
}

/// Connection attempts per (re)connect, with exponential backoff between them.
const CONNECT_RETRIES: usize = 2;
const RETRY_EXPONENT_BASE: u64 = 2;
const RETRY_FACTOR_MS: u64 = 100;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(1);
const COMMAND_TIMEOUT: Duration = Duration::from_secs(1);

/// Redis-backed `JobCache`. The `ConnectionManager` is created on first use
/// and reconnects on its own after the server drops the connection.
pub struct RedisJobCache {
    client: RedisClient,
    conn: OnceCell<ConnectionManager>,
}

impl RedisJobCache {
    pub fn new(client: RedisClient) -> Self {
        Self {
            client,
            conn: OnceCell::new(),
        }
    }

    async fn connection(&self) -> RedisResult<ConnectionManager> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                let conn = ConnectionManager::new_with_backoff_and_timeouts(
                    self.client.clone(),
                    RETRY_EXPONENT_BASE,
                    RETRY_FACTOR_MS,
                    CONNECT_RETRIES,
                    COMMAND_TIMEOUT,
                    CONNECT_TIMEOUT,
                )
                .await?;
                info!("Redis connection established");
                Ok::<_, redis::RedisError>(conn)
            })
            .await?;
        Ok(conn.clone())
    }
}

#[async_trait]
impl JobCache for RedisJobCache {
    async fn get(&self, job_id: i64) -> RedisResult<Option<String>> {
        let mut conn = self.connection().await?;
        let value: Option<String> = redis::cmd("GET")
            .arg(cache_key(job_id))
            .query_async(&mut conn)
            .await?;
        Ok(value)
    }

    async fn set(&self, job_id: i64, payload: String, ttl: Duration) -> RedisResult<()> {
        let mut conn = self.connection().await?;
        // EX takes whole seconds; a sub-second TTL would be rejected by Redis.
        let seconds = ttl.as_secs().max(1);
        let _: () = redis::cmd("SET")
            .arg(cache_key(job_id))
            .arg(payload)
            .arg("EX")
            .arg(seconds)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }
}
