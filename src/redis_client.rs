use redis::{aio::MultiplexedConnection, Client};
use std::time::Duration;

/// Shared multiplexed connection; cloning is cheap.
#[derive(Clone)]
pub struct RedisClient {
    pub conn: MultiplexedConnection,
}

impl RedisClient {
    pub async fn connect(redis_url: &str) -> redis::RedisResult<Self> {
        let client = Client::open(redis_url)?;
        let conn = client.get_multiplexed_tokio_connection().await?;
        Ok(RedisClient { conn })
    }

    /// `PING` bounded by `timeout`; a slow server counts as unreachable.
    pub async fn is_reachable(&self, timeout: Duration) -> bool {
        let mut conn = self.conn.clone();
        let cmd = redis::cmd("PING");
        let ping = cmd.query_async::<String>(&mut conn);
        matches!(tokio::time::timeout(timeout, ping).await, Ok(Ok(_)))
    }
}
