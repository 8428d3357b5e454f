//! Оформление брони.
//!
//! Порядок проверок важен: без сессии отказываем раньше любого обращения к
//! хранилищу. Итоговая сумма пересчитывается на сервере, присланная
//! клиентом только сверяется. От двойной продажи места защищает
//! уникальность (сеанс, место) в хранилище; предварительная проверка по
//! снимку занятых мест лишь даёт понятную ошибку раньше.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::BookingError;
use crate::models::{Booking, BookingDetails, NewBooking, SeatCode, Session, Showtime};
use crate::services::pricing::PriceTable;
use crate::services::seat_map::{BookedSeats, SeatLayout, SeatMapView};
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub showtime_id: Uuid,
    pub seats: Vec<String>,
    pub total_price: i32,
}

/// "Мои бронирования": брони с подробностями и сводка.
#[derive(Debug, Clone, Serialize)]
pub struct UserBookings {
    pub bookings: Vec<BookingDetails>,
    pub count: usize,
    pub total_spent: i64,
}

pub struct BookingService {
    store: Arc<dyn Store>,
    layout: SeatLayout,
    max_seats: usize,
}

impl BookingService {
    pub fn new(store: Arc<dyn Store>, layout: SeatLayout, max_seats: usize) -> Self {
        Self {
            store,
            layout,
            max_seats,
        }
    }

    pub fn layout(&self) -> SeatLayout {
        self.layout
    }

    pub fn max_seats(&self) -> usize {
        self.max_seats
    }

    pub async fn find_showtime(&self, showtime_id: Uuid) -> Result<Showtime, BookingError> {
        self.store
            .find_showtime(showtime_id)
            .await?
            .ok_or(BookingError::ShowtimeNotFound)
    }

    /// Свежий снимок занятых мест сеанса.
    pub async fn booked_seats(&self, showtime_id: Uuid) -> Result<BookedSeats, BookingError> {
        let seats = self.store.confirmed_seats(showtime_id).await?;
        Ok(seats.into_iter().collect())
    }

    /// Цены сеанса. Ключ для расчёта цены - внешний id фильма.
    pub async fn prices_for(&self, showtime: &Showtime) -> Result<PriceTable, BookingError> {
        let movie_key = self
            .store
            .find_movie(showtime.movie_id)
            .await?
            .map(|movie| movie.external_id)
            .unwrap_or_default();
        Ok(PriceTable::for_showtime(showtime, &movie_key))
    }

    pub async fn seat_map(
        &self,
        showtime_id: Uuid,
        booked: &BookedSeats,
    ) -> Result<SeatMapView, BookingError> {
        let showtime = self.find_showtime(showtime_id).await?;
        let prices = self.prices_for(&showtime).await?;
        Ok(SeatMapView::render(self.layout, prices, booked))
    }

    /// Разбор и проверка мест без обращения к хранилищу.
    pub fn validate_seats(&self, seats: &[String]) -> Result<Vec<SeatCode>, BookingError> {
        if seats.is_empty() {
            return Err(BookingError::EmptySelection);
        }
        if seats.len() > self.max_seats {
            return Err(BookingError::TooManySeats(self.max_seats));
        }

        let mut seen = BTreeSet::new();
        let mut parsed = Vec::with_capacity(seats.len());
        for raw in seats {
            let seat: SeatCode = raw
                .parse()
                .map_err(|_| BookingError::InvalidSeat(raw.clone()))?;
            if !self.layout.contains(&seat) {
                return Err(BookingError::InvalidSeat(seat.to_string()));
            }
            if !seen.insert(seat) {
                return Err(BookingError::DuplicateSeat(seat.to_string()));
            }
            parsed.push(seat);
        }
        Ok(parsed)
    }

    pub async fn submit_booking(
        &self,
        session: Option<&Session>,
        request: BookingRequest,
    ) -> Result<Booking, BookingError> {
        let session = session.ok_or(BookingError::NotAuthenticated)?;
        let seats = self.validate_seats(&request.seats)?;

        let showtime = self.find_showtime(request.showtime_id).await?;
        let prices = self.prices_for(&showtime).await?;
        let expected = prices.total(&seats);
        if expected != request.total_price {
            warn!(
                "Price mismatch for showtime {}: expected {}, submitted {}",
                showtime.id, expected, request.total_price
            );
            return Err(BookingError::PriceMismatch {
                expected,
                submitted: request.total_price,
            });
        }

        let booked = self.booked_seats(showtime.id).await?;
        let conflicts: Vec<String> = seats
            .iter()
            .filter(|seat| booked.contains(seat))
            .map(|seat| seat.to_string())
            .collect();
        if !conflicts.is_empty() {
            return Err(BookingError::SeatConflict(conflicts));
        }

        let new_booking = NewBooking {
            user_id: session.user_id,
            showtime_id: showtime.id,
            seats,
            total_price: expected,
        };

        match self.store.insert_booking(new_booking).await {
            Ok(booking) => {
                info!(
                    "Booking {} confirmed: user {}, showtime {}, {} seats, total {}",
                    booking.id,
                    booking.user_id,
                    booking.showtime_id,
                    booking.seats.len(),
                    booking.total_price
                );
                Ok(booking)
            }
            Err(StoreError::SeatsTaken(taken)) => {
                warn!("Seat conflict on showtime {}: {:?}", showtime.id, taken);
                Err(BookingError::SeatConflict(taken))
            }
            Err(e) => Err(BookingError::SubmissionFailed(e)),
        }
    }

    pub async fn user_bookings(&self, session: Option<&Session>) -> Result<UserBookings, BookingError> {
        let session = session.ok_or(BookingError::NotAuthenticated)?;
        let bookings = self.store.bookings_for_user(session.user_id).await?;

        let theaters: HashMap<Uuid, _> = self
            .store
            .list_theaters()
            .await?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();

        let mut details = Vec::with_capacity(bookings.len());
        for booking in bookings {
            let showtime = self.store.find_showtime(booking.showtime_id).await?;
            let movie = match &showtime {
                Some(s) => self.store.find_movie(s.movie_id).await?,
                None => None,
            };
            let theater = showtime
                .as_ref()
                .and_then(|s| theaters.get(&s.theater_id).cloned());
            details.push(BookingDetails {
                booking,
                showtime,
                theater,
                movie,
            });
        }

        let total_spent = details
            .iter()
            .map(|d| i64::from(d.booking.total_price))
            .sum();
        Ok(UserBookings {
            count: details.len(),
            total_spent,
            bookings: details,
        })
    }
}
