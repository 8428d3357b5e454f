use rand::{distributions::Alphanumeric, Rng};
use redis::AsyncCommands;
use tracing::info;

use crate::cache::CacheService;
use crate::models::Session;

const TOKEN_LENGTH: usize = 48;

fn session_key(token: &str) -> String {
    format!("session:{}", token)
}

pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

impl CacheService {
    /// Создать сессию и вернуть bearer-токен
    pub async fn create_session(
        &self,
        session: &Session,
        ttl_seconds: u64,
    ) -> Result<String, redis::RedisError> {
        let token = generate_token();
        self.set_json(&session_key(&token), session, ttl_seconds).await?;
        info!("Created session for user {}", session.email);
        Ok(token)
    }

    pub async fn get_session(&self, token: &str) -> Result<Option<Session>, redis::RedisError> {
        self.get_json(&session_key(token)).await
    }

    /// Удалить сессию (logout)
    pub async fn invalidate_session(&self, token: &str) -> Result<(), redis::RedisError> {
        let mut conn = self.redis.conn.clone();
        let _: () = conn.del(session_key(token)).await?;
        Ok(())
    }
}
