use redis::AsyncCommands;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cache::CacheService;
use crate::models::SeatCode;
use crate::services::seat_map::BookedSeats;

fn seats_key(showtime_id: Uuid) -> String {
    format!("seats:{}", showtime_id)
}

impl CacheService {
    /// Снимок занятых мест из кеша. Ошибка Redis - то же, что промах.
    pub async fn get_booked_seats(&self, showtime_id: Uuid) -> Option<BookedSeats> {
        match self.get_json::<Vec<SeatCode>>(&seats_key(showtime_id)).await {
            Ok(seats) => seats.map(|s| s.into_iter().collect()),
            Err(e) => {
                warn!("Failed to read seats cache for showtime {}: {}", showtime_id, e);
                None
            }
        }
    }

    pub async fn save_booked_seats(&self, showtime_id: Uuid, booked: &BookedSeats) {
        let seats: Vec<SeatCode> = booked.iter().copied().collect();
        if let Err(e) = self
            .set_json(&seats_key(showtime_id), &seats, self.config.seats_ttl_seconds)
            .await
        {
            warn!("Failed to cache seats for showtime {}: {}", showtime_id, e);
        }
    }

    /// Вызывается после каждой новой брони. `false` - удалить не удалось,
    /// и до истечения TTL в кеше может лежать устаревший снимок.
    pub async fn invalidate_seats(&self, showtime_id: Uuid) -> bool {
        let mut conn = self.redis.conn.clone();
        let deleted: redis::RedisResult<()> = conn.del(seats_key(showtime_id)).await;
        match deleted {
            Ok(()) => {
                info!("Invalidated seats cache for showtime {}", showtime_id);
                true
            }
            Err(e) => {
                warn!(
                    "Failed to invalidate seats cache for showtime {} (stale for up to {}s): {}",
                    showtime_id, self.config.seats_ttl_seconds, e
                );
                false
            }
        }
    }
}
