use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::Theater;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Showtime {
    pub id: Uuid,
    pub movie_id: Uuid,
    pub theater_id: Uuid,
    /// Локальное время начала сеанса.
    pub starts_at: NaiveDateTime,
    pub screen: String,
    pub price_standard: i32,
    pub price_vip: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewShowtime {
    pub movie_id: Uuid,
    pub theater_id: Uuid,
    pub starts_at: NaiveDateTime,
    pub screen: String,
    pub price_standard: i32,
    pub price_vip: i32,
}

impl NewShowtime {
    pub fn into_showtime(self, id: Uuid) -> Showtime {
        Showtime {
            id,
            movie_id: self.movie_id,
            theater_id: self.theater_id,
            starts_at: self.starts_at,
            screen: self.screen,
            price_standard: self.price_standard,
            price_vip: self.price_vip,
        }
    }
}

/// Сеанс вместе с кинотеатром - так его отдаём клиенту.
#[derive(Debug, Clone, Serialize)]
pub struct ShowtimeListing {
    #[serde(flatten)]
    pub showtime: Showtime,
    pub theater: Option<Theater>,
}

/// Полуинтервал [00:00 дня, 00:00 следующего дня) по локальному времени.
pub fn day_window(date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let start = date.and_time(NaiveTime::MIN);
    (start, start + Duration::days(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_window_covers_whole_day() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let (from, to) = day_window(date);
        assert_eq!(from.date(), date);
        assert_eq!(to.date(), NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
        let late = date.and_hms_opt(23, 59, 59).unwrap();
        assert!(late >= from && late < to);
    }
}
