use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Movie, SeatCode, Showtime, Theater};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub showtime_id: Uuid,
    pub seats: Vec<SeatCode>,
    pub total_price: i32,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub user_id: Uuid,
    pub showtime_id: Uuid,
    pub seats: Vec<SeatCode>,
    pub total_price: i32,
}

impl NewBooking {
    pub fn into_booking(self, id: Uuid, created_at: DateTime<Utc>) -> Booking {
        Booking {
            id,
            user_id: self.user_id,
            showtime_id: self.showtime_id,
            seats: self.seats,
            total_price: self.total_price,
            status: BookingStatus::Confirmed,
            created_at,
        }
    }
}

/// Бронь со всем, что нужно для билета в "Мои бронирования".
#[derive(Debug, Clone, Serialize)]
pub struct BookingDetails {
    #[serde(flatten)]
    pub booking: Booking,
    pub showtime: Option<Showtime>,
    pub theater: Option<Theater>,
    pub movie: Option<Movie>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    pub bookings: i64,
    pub revenue: i64,
    pub movies: i64,
}
