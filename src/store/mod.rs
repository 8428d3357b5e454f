//! Хранилище: каталог, сеансы, брони, избранное и пользователи.
//!
//! Бизнес-логика работает только через трейт [`Store`]. В проде это
//! [`PgStore`] (Postgres через sqlx), для локального запуска и тестов -
//! [`MemoryStore`]. Транзакций между коллекциями трейт не обещает: каждая
//! операция атомарна сама по себе, последовательные записи должны быть
//! идемпотентными.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Booking, DashboardStats, Favorite, Movie, NewBooking, NewMovie, NewShowtime, NewTheater,
    NewUser, SeatCode, Showtime, Theater, User,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Нарушена уникальность (сеанс, место) - кто-то успел раньше.
    #[error("seats already taken: {}", .0.join(", "))]
    SeatsTaken(Vec<String>),

    #[error("duplicate record: {0}")]
    Duplicate(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    // === Пользователи ===
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;

    // === Фильмы ===
    async fn find_movie(&self, id: Uuid) -> StoreResult<Option<Movie>>;
    async fn find_movie_by_external_id(&self, external_id: &str) -> StoreResult<Option<Movie>>;
    async fn insert_movie(&self, movie: NewMovie) -> StoreResult<Movie>;
    async fn list_movies(&self) -> StoreResult<Vec<Movie>>;
    async fn search_movies(&self, query: &str, limit: i64) -> StoreResult<Vec<Movie>>;
    /// Удаляет фильм вместе с его сеансами.
    async fn delete_movie(&self, id: Uuid) -> StoreResult<bool>;
    async fn movies_with_showtimes_from(&self, from: NaiveDateTime) -> StoreResult<Vec<Movie>>;

    // === Кинотеатры ===
    async fn list_theaters(&self) -> StoreResult<Vec<Theater>>;
    async fn insert_theaters(&self, theaters: Vec<NewTheater>) -> StoreResult<usize>;

    // === Сеансы ===
    async fn find_showtime(&self, id: Uuid) -> StoreResult<Option<Showtime>>;
    /// Сеансы фильма в пределах локального дня, по времени начала.
    async fn showtimes_on(&self, movie_id: Uuid, date: NaiveDate) -> StoreResult<Vec<Showtime>>;
    async fn upcoming_showtimes(&self, from: NaiveDateTime) -> StoreResult<Vec<Showtime>>;
    async fn insert_showtimes(&self, showtimes: Vec<NewShowtime>) -> StoreResult<Vec<Showtime>>;
    async fn delete_showtime(&self, id: Uuid) -> StoreResult<bool>;

    // === Брони ===
    /// Объединение мест всех подтверждённых броней сеанса.
    async fn confirmed_seats(&self, showtime_id: Uuid) -> StoreResult<Vec<SeatCode>>;
    /// Вставляет подтверждённую бронь. Занятое место - `StoreError::SeatsTaken`.
    async fn insert_booking(&self, booking: NewBooking) -> StoreResult<Booking>;
    async fn bookings_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Booking>>;
    async fn dashboard_stats(&self) -> StoreResult<DashboardStats>;

    // === Избранное ===
    async fn find_favorite(&self, user_id: Uuid, movie_id: &str) -> StoreResult<Option<Favorite>>;
    async fn insert_favorite(&self, favorite: Favorite) -> StoreResult<()>;
    async fn delete_favorite(&self, user_id: Uuid, movie_id: &str) -> StoreResult<bool>;
    async fn favorites_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Favorite>>;
}
