use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::models::{
    Booking, BookingStatus, DashboardStats, Favorite, Movie, NewBooking, NewMovie, NewShowtime,
    NewTheater, NewUser, SeatCode, Showtime, Theater, User,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    movies: Vec<Movie>,
    theaters: Vec<Theater>,
    showtimes: Vec<Showtime>,
    bookings: Vec<Booking>,
    favorites: Vec<Favorite>,
}

/// Хранилище в памяти процесса. Семантика совпадает с [`super::PgStore`],
/// включая каскадное удаление и уникальность (сеанс, место).
///
/// Умеет имитировать отказ записи и считает обращения - удобно, чтобы
/// проверить, что операция отвергнута до похода в хранилище.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    fail_writes: AtomicBool,
    calls: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Все последующие записи будут падать с `StoreError::Unavailable`.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Сколько раз к хранилищу обращались (чтение и запись).
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Сколько было попыток записи, включая неудачные.
    pub fn write_attempts(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn read(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn write(&self) -> StoreResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        Ok(())
    }
}

fn sorted_showtimes(mut showtimes: Vec<Showtime>) -> Vec<Showtime> {
    showtimes.sort_by(|a, b| a.starts_at.cmp(&b.starts_at).then(a.id.cmp(&b.id)));
    showtimes
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.read();
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        self.write()?;
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(StoreError::Duplicate(format!("user {}", user.email)));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            display_name: user.display_name,
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_movie(&self, id: Uuid) -> StoreResult<Option<Movie>> {
        self.read();
        let tables = self.tables.read().await;
        Ok(tables.movies.iter().find(|m| m.id == id).cloned())
    }

    async fn find_movie_by_external_id(&self, external_id: &str) -> StoreResult<Option<Movie>> {
        self.read();
        let tables = self.tables.read().await;
        Ok(tables
            .movies
            .iter()
            .find(|m| m.external_id == external_id)
            .cloned())
    }

    async fn insert_movie(&self, movie: NewMovie) -> StoreResult<Movie> {
        self.write()?;
        let mut tables = self.tables.write().await;
        if tables.movies.iter().any(|m| m.external_id == movie.external_id) {
            return Err(StoreError::Duplicate(format!("movie {}", movie.external_id)));
        }
        let movie = movie.into_movie(Uuid::new_v4(), Utc::now());
        tables.movies.push(movie.clone());
        Ok(movie)
    }

    async fn list_movies(&self) -> StoreResult<Vec<Movie>> {
        self.read();
        let tables = self.tables.read().await;
        let mut movies = tables.movies.clone();
        movies.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(movies)
    }

    async fn search_movies(&self, query: &str, limit: i64) -> StoreResult<Vec<Movie>> {
        self.read();
        let needle = query.to_lowercase();
        let tables = self.tables.read().await;
        Ok(tables
            .movies
            .iter()
            .filter(|m| m.title.to_lowercase().contains(&needle))
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn delete_movie(&self, id: Uuid) -> StoreResult<bool> {
        self.write()?;
        let mut tables = self.tables.write().await;
        let before = tables.movies.len();
        tables.movies.retain(|m| m.id != id);
        if tables.movies.len() == before {
            return Ok(false);
        }
        let dropped: HashSet<Uuid> = tables
            .showtimes
            .iter()
            .filter(|s| s.movie_id == id)
            .map(|s| s.id)
            .collect();
        tables.showtimes.retain(|s| s.movie_id != id);
        tables.bookings.retain(|b| !dropped.contains(&b.showtime_id));
        Ok(true)
    }

    async fn movies_with_showtimes_from(&self, from: NaiveDateTime) -> StoreResult<Vec<Movie>> {
        self.read();
        let tables = self.tables.read().await;
        let ids: HashSet<Uuid> = tables
            .showtimes
            .iter()
            .filter(|s| s.starts_at >= from)
            .map(|s| s.movie_id)
            .collect();
        let mut movies: Vec<Movie> = tables
            .movies
            .iter()
            .filter(|m| ids.contains(&m.id))
            .cloned()
            .collect();
        movies.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(movies)
    }

    async fn list_theaters(&self) -> StoreResult<Vec<Theater>> {
        self.read();
        let tables = self.tables.read().await;
        let mut theaters = tables.theaters.clone();
        theaters.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(theaters)
    }

    async fn insert_theaters(&self, theaters: Vec<NewTheater>) -> StoreResult<usize> {
        self.write()?;
        let mut tables = self.tables.write().await;
        let count = theaters.len();
        tables.theaters.extend(theaters.into_iter().map(|t| Theater {
            id: Uuid::new_v4(),
            name: t.name,
            location: t.location,
            facilities: t.facilities,
        }));
        Ok(count)
    }

    async fn find_showtime(&self, id: Uuid) -> StoreResult<Option<Showtime>> {
        self.read();
        let tables = self.tables.read().await;
        Ok(tables.showtimes.iter().find(|s| s.id == id).cloned())
    }

    async fn showtimes_on(&self, movie_id: Uuid, date: NaiveDate) -> StoreResult<Vec<Showtime>> {
        self.read();
        let tables = self.tables.read().await;
        Ok(sorted_showtimes(
            tables
                .showtimes
                .iter()
                .filter(|s| s.movie_id == movie_id && s.starts_at.date() == date)
                .cloned()
                .collect(),
        ))
    }

    async fn upcoming_showtimes(&self, from: NaiveDateTime) -> StoreResult<Vec<Showtime>> {
        self.read();
        let tables = self.tables.read().await;
        Ok(sorted_showtimes(
            tables
                .showtimes
                .iter()
                .filter(|s| s.starts_at >= from)
                .cloned()
                .collect(),
        ))
    }

    async fn insert_showtimes(&self, showtimes: Vec<NewShowtime>) -> StoreResult<Vec<Showtime>> {
        self.write()?;
        let mut tables = self.tables.write().await;
        for new in &showtimes {
            if !tables.movies.iter().any(|m| m.id == new.movie_id) {
                return Err(StoreError::Corrupt(format!("unknown movie {}", new.movie_id)));
            }
            if !tables.theaters.iter().any(|t| t.id == new.theater_id) {
                return Err(StoreError::Corrupt(format!("unknown theater {}", new.theater_id)));
            }
        }
        let created: Vec<Showtime> = showtimes
            .into_iter()
            .map(|s| s.into_showtime(Uuid::new_v4()))
            .collect();
        tables.showtimes.extend(created.iter().cloned());
        Ok(created)
    }

    async fn delete_showtime(&self, id: Uuid) -> StoreResult<bool> {
        self.write()?;
        let mut tables = self.tables.write().await;
        let before = tables.showtimes.len();
        tables.showtimes.retain(|s| s.id != id);
        let removed = tables.showtimes.len() != before;
        if removed {
            tables.bookings.retain(|b| b.showtime_id != id);
        }
        Ok(removed)
    }

    async fn confirmed_seats(&self, showtime_id: Uuid) -> StoreResult<Vec<SeatCode>> {
        self.read();
        let tables = self.tables.read().await;
        Ok(tables
            .bookings
            .iter()
            .filter(|b| b.showtime_id == showtime_id && b.status == BookingStatus::Confirmed)
            .flat_map(|b| b.seats.iter().copied())
            .collect())
    }

    async fn insert_booking(&self, booking: NewBooking) -> StoreResult<Booking> {
        self.write()?;
        let mut tables = self.tables.write().await;
        if !tables.showtimes.iter().any(|s| s.id == booking.showtime_id) {
            return Err(StoreError::Corrupt(format!("unknown showtime {}", booking.showtime_id)));
        }

        // Аналог UNIQUE (showtime_id, seat_code) из booking_seats
        let mut taken: HashSet<SeatCode> = tables
            .bookings
            .iter()
            .filter(|b| b.showtime_id == booking.showtime_id && b.status == BookingStatus::Confirmed)
            .flat_map(|b| b.seats.iter().copied())
            .collect();
        let mut conflicts = Vec::new();
        for seat in &booking.seats {
            if !taken.insert(*seat) {
                conflicts.push(seat.to_string());
            }
        }
        if !conflicts.is_empty() {
            return Err(StoreError::SeatsTaken(conflicts));
        }

        let booking = booking.into_booking(Uuid::new_v4(), Utc::now());
        tables.bookings.push(booking.clone());
        Ok(booking)
    }

    async fn bookings_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Booking>> {
        self.read();
        let tables = self.tables.read().await;
        let mut bookings: Vec<Booking> = tables
            .bookings
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn dashboard_stats(&self) -> StoreResult<DashboardStats> {
        self.read();
        let tables = self.tables.read().await;
        Ok(DashboardStats {
            bookings: tables.bookings.len() as i64,
            revenue: tables
                .bookings
                .iter()
                .filter(|b| b.status == BookingStatus::Confirmed)
                .map(|b| b.total_price as i64)
                .sum(),
            movies: tables.movies.len() as i64,
        })
    }

    async fn find_favorite(&self, user_id: Uuid, movie_id: &str) -> StoreResult<Option<Favorite>> {
        self.read();
        let tables = self.tables.read().await;
        Ok(tables
            .favorites
            .iter()
            .find(|f| f.user_id == user_id && f.movie_id == movie_id)
            .cloned())
    }

    async fn insert_favorite(&self, favorite: Favorite) -> StoreResult<()> {
        self.write()?;
        let mut tables = self.tables.write().await;
        if tables
            .favorites
            .iter()
            .any(|f| f.user_id == favorite.user_id && f.movie_id == favorite.movie_id)
        {
            return Err(StoreError::Duplicate(format!("favorite {}", favorite.movie_id)));
        }
        tables.favorites.push(favorite);
        Ok(())
    }

    async fn delete_favorite(&self, user_id: Uuid, movie_id: &str) -> StoreResult<bool> {
        self.write()?;
        let mut tables = self.tables.write().await;
        let before = tables.favorites.len();
        tables
            .favorites
            .retain(|f| !(f.user_id == user_id && f.movie_id == movie_id));
        Ok(tables.favorites.len() != before)
    }

    async fn favorites_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Favorite>> {
        self.read();
        let tables = self.tables.read().await;
        let mut favorites: Vec<Favorite> = tables
            .favorites
            .iter()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect();
        favorites.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(favorites)
    }
}
