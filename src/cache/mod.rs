use crate::{config::CacheConfig, redis_client::RedisClient};
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};

pub mod auth;
pub mod checkout;
pub mod search;
pub mod seats;

pub use checkout::HeldCheckout;

/// Всё, что лежит в Redis: сессии, ожидающие оплаты заказы и кеши.
#[derive(Clone)]
pub struct CacheService {
    redis: RedisClient,
    config: CacheConfig,
}

impl CacheService {
    pub fn new(redis: RedisClient, config: CacheConfig) -> Self {
        Self { redis, config }
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, redis::RedisError> {
        let mut conn = self.redis.conn.clone();
        let data: Option<String> = conn.get(key).await?;
        match data {
            Some(data) => serde_json::from_str(&data).map(Some).map_err(|_| {
                redis::RedisError::from((redis::ErrorKind::TypeError, "Parse error"))
            }),
            None => Ok(None),
        }
    }

    async fn set_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl_seconds: u64,
    ) -> Result<(), redis::RedisError> {
        let data = serde_json::to_string(value).map_err(|_| {
            redis::RedisError::from((redis::ErrorKind::TypeError, "Serialize error"))
        })?;
        let mut conn = self.redis.conn.clone();
        conn.set_ex(key, data, ttl_seconds.max(1)).await
    }
}
