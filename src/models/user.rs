use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    // Проверить пароль (bcrypt; битый хеш считаем несовпадением)
    pub fn verify_password(&self, password: &str) -> bool {
        bcrypt::verify(password, &self.password_hash).unwrap_or(false)
    }

    pub fn session(&self) -> Session {
        Session {
            user_id: self.id,
            email: self.email.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
}

/// Текущий пользователь. Появляется при логине, удаляется при логауте;
/// передаётся в сервисы явно, глобального состояния нет.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifies_bcrypt_hash() {
        let user = User {
            id: Uuid::new_v4(),
            email: "viewer@example.com".to_string(),
            password_hash: bcrypt::hash("popcorn", 4).unwrap(),
            display_name: "Viewer".to_string(),
            created_at: Utc::now(),
        };
        assert!(user.verify_password("popcorn"));
        assert!(!user.verify_password("nachos"));
    }
}
