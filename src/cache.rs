use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::{Activity, ActivityFilter, RoomType};
use crate::redis_client::RedisClient;
use crate::store::ReservationStore;

const ROOM_TYPES_KEY: &str = "catalog:room_types";

/// Read-through cache for catalog listings. Redis is optional; every cache
/// failure falls back to the store. Availability and reservations are
/// never cached.
#[derive(Clone)]
pub struct CacheService {
    redis: Option<RedisClient>,
    store: Arc<dyn ReservationStore>,
    ttl_seconds: u64,
}

impl CacheService {
    pub fn new(redis: Option<RedisClient>, store: Arc<dyn ReservationStore>, ttl_seconds: u64) -> Self {
        Self { redis, store, ttl_seconds }
    }

    pub fn is_enabled(&self) -> bool {
        self.redis.is_some()
    }

    /// `None` when caching is disabled.
    pub async fn is_reachable(&self) -> Option<bool> {
        match &self.redis {
            Some(redis) => Some(redis.is_reachable(Duration::from_secs(1)).await),
            None => None,
        }
    }

    // Cache warmup at startup
    pub async fn warmup(&self) {
        if !self.is_enabled() {
            return;
        }
        info!("starting catalog cache warmup");
        let room_types = self.room_types().await.map(|t| t.len()).unwrap_or_default();
        let activities = self
            .activities(&ActivityFilter::default())
            .await
            .map(|a| a.len())
            .unwrap_or_default();
        info!(room_types, activities, "catalog cache warmed up");
    }

    pub async fn room_types(&self) -> Result<Vec<RoomType>> {
        self.read_through(ROOM_TYPES_KEY, || self.store.list_room_types()).await
    }

    pub async fn activities(&self, filter: &ActivityFilter) -> Result<Vec<Activity>> {
        self.read_through(&filter.cache_key(), || self.store.list_activities(filter))
            .await
    }

    async fn read_through<T, F, Fut>(&self, key: &str, load: F) -> Result<Vec<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        let Some(redis) = &self.redis else {
            return load().await;
        };

        // Cache first
        match get_json::<Vec<T>>(redis, key).await {
            Ok(Some(items)) => {
                debug!(key, "catalog cache hit");
                return Ok(items);
            }
            Ok(None) => debug!(key, "catalog cache miss"),
            Err(e) => warn!(key, error = %e, "catalog cache read failed"),
        }

        // Miss or broken cache: load from the store
        let items = load().await?;
        if let Err(e) = set_json(redis, key, &items, self.ttl_seconds).await {
            warn!(key, error = %e, "catalog cache write failed");
        }
        Ok(items)
    }
}

async fn get_json<T: DeserializeOwned>(redis: &RedisClient, key: &str) -> redis::RedisResult<Option<T>> {
    let mut conn = redis.conn.clone();
    let data: Option<String> = conn.get(key).await?;
    data.map(|raw| {
        serde_json::from_str(&raw)
            .map_err(|_| redis::RedisError::from((redis::ErrorKind::TypeError, "Parse error")))
    })
    .transpose()
}

async fn set_json<T: Serialize>(redis: &RedisClient, key: &str, value: &T, ttl_seconds: u64) -> redis::RedisResult<()> {
    let data = serde_json::to_string(value)
        .map_err(|_| redis::RedisError::from((redis::ErrorKind::TypeError, "Serialize error")))?;
    let mut conn = redis.conn.clone();
    conn.set_ex(key, data, ttl_seconds).await
}
