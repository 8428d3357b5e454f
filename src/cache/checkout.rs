use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cache::CacheService;
use crate::services::checkout::CheckoutHold;

/// Заказ, ожидающий оплаты, вместе с владельцем.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeldCheckout {
    pub user_id: Uuid,
    pub hold: CheckoutHold,
}

fn checkout_key(id: Uuid) -> String {
    format!("checkout:{}", id)
}

impl CacheService {
    pub async fn save_checkout(
        &self,
        held: &HeldCheckout,
        ttl_seconds: u64,
    ) -> Result<(), redis::RedisError> {
        self.set_json(&checkout_key(held.hold.id), held, ttl_seconds).await
    }

    /// Забирает заказ: второй вызов для того же id вернёт `None`.
    pub async fn take_checkout(&self, id: Uuid) -> Result<Option<HeldCheckout>, redis::RedisError> {
        let mut conn = self.redis.conn.clone();
        let data: Option<String> = redis::cmd("GETDEL")
            .arg(checkout_key(id))
            .query_async(&mut conn)
            .await?;
        match data {
            Some(data) => serde_json::from_str(&data).map(Some).map_err(|_| {
                redis::RedisError::from((redis::ErrorKind::TypeError, "Parse error"))
            }),
            None => Ok(None),
        }
    }
}
