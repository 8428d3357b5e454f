use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::MovieSnapshot;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favorite {
    pub user_id: Uuid,
    pub movie_id: String,
    pub movie: MovieSnapshot,
    pub created_at: DateTime<Utc>,
}
