use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::database::Database;
use crate::models::showtime::day_window;
use crate::models::{
    Booking, BookingStatus, DashboardStats, Favorite, Movie, MovieSnapshot, NewBooking, NewMovie,
    NewShowtime, NewTheater, NewUser, SeatCode, Showtime, Theater, User,
};

const MOVIE_COLUMNS: &str = "id, external_id, title, poster_url, backdrop_url, genres, \
     runtime_minutes, release_date, rating, created_at";
const SHOWTIME_COLUMNS: &str =
    "id, movie_id, theater_id, starts_at, screen, price_standard, price_vip";
const BOOKING_COLUMNS: &str = "id, user_id, showtime_id, seats, total_price, status, created_at";

#[derive(Clone)]
pub struct PgStore {
    db: Database,
}

impl PgStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    // Какие из мест уже лежат в booking_seats этого сеанса
    async fn taken_among(&self, showtime_id: Uuid, seats: &[String]) -> StoreResult<Vec<String>> {
        let taken = sqlx::query_scalar::<_, String>(
            "SELECT seat_code FROM booking_seats WHERE showtime_id = $1 AND seat_code = ANY($2)",
        )
        .bind(showtime_id)
        .bind(seats)
        .fetch_all(&self.db.pool)
        .await?;
        Ok(taken)
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|db| db.is_foreign_key_violation())
}

// Строка bookings: места хранятся как TEXT[], наружу - типизированные коды
#[derive(FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: Uuid,
    showtime_id: Uuid,
    seats: Vec<String>,
    total_price: i32,
    status: BookingStatus,
    created_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let seats = row
            .seats
            .iter()
            .map(|s| s.parse::<SeatCode>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::Corrupt(format!("booking {}: {}", row.id, e)))?;
        Ok(Booking {
            id: row.id,
            user_id: row.user_id,
            showtime_id: row.showtime_id,
            seats,
            total_price: row.total_price,
            status: row.status,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct FavoriteRow {
    user_id: Uuid,
    movie_id: String,
    movie: Json<MovieSnapshot>,
    created_at: DateTime<Utc>,
}

impl From<FavoriteRow> for Favorite {
    fn from(row: FavoriteRow) -> Self {
        Favorite {
            user_id: row.user_id,
            movie_id: row.movie_id,
            movie: row.movie.0,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, display_name, created_at
             FROM users WHERE lower(email) = lower($1)",
        )
        .bind(email)
        .fetch_optional(&self.db.pool)
        .await?;
        Ok(user)
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, email, password_hash, display_name)
             VALUES ($1, $2, $3, $4)
             RETURNING id, email, password_hash, display_name, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.display_name)
        .fetch_one(&self.db.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Duplicate(format!("user {}", user.email))
            } else {
                e.into()
            }
        })
    }

    async fn find_movie(&self, id: Uuid) -> StoreResult<Option<Movie>> {
        let movie = sqlx::query_as::<_, Movie>(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movies WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db.pool)
        .await?;
        Ok(movie)
    }

    async fn find_movie_by_external_id(&self, external_id: &str) -> StoreResult<Option<Movie>> {
        let movie = sqlx::query_as::<_, Movie>(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movies WHERE external_id = $1"
        ))
        .bind(external_id)
        .fetch_optional(&self.db.pool)
        .await?;
        Ok(movie)
    }

    async fn insert_movie(&self, movie: NewMovie) -> StoreResult<Movie> {
        sqlx::query_as::<_, Movie>(&format!(
            "INSERT INTO movies (id, external_id, title, poster_url, backdrop_url, genres,
                                 runtime_minutes, release_date, rating)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {MOVIE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&movie.external_id)
        .bind(&movie.title)
        .bind(&movie.poster_url)
        .bind(&movie.backdrop_url)
        .bind(&movie.genres)
        .bind(movie.runtime_minutes)
        .bind(movie.release_date)
        .bind(movie.rating)
        .fetch_one(&self.db.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Duplicate(format!("movie {}", movie.external_id))
            } else {
                e.into()
            }
        })
    }

    async fn list_movies(&self) -> StoreResult<Vec<Movie>> {
        let movies = sqlx::query_as::<_, Movie>(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movies ORDER BY created_at DESC"
        ))
        .fetch_all(&self.db.pool)
        .await?;
        Ok(movies)
    }

    async fn search_movies(&self, query: &str, limit: i64) -> StoreResult<Vec<Movie>> {
        let pattern = format!(
            "%{}%",
            query.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
        );
        let movies = sqlx::query_as::<_, Movie>(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movies WHERE title ILIKE $1 ORDER BY title LIMIT $2"
        ))
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.db.pool)
        .await?;
        Ok(movies)
    }

    async fn delete_movie(&self, id: Uuid) -> StoreResult<bool> {
        // showtimes и bookings уходят по ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id)
            .execute(&self.db.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn movies_with_showtimes_from(&self, from: NaiveDateTime) -> StoreResult<Vec<Movie>> {
        let movies = sqlx::query_as::<_, Movie>(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movies
             WHERE id IN (SELECT DISTINCT movie_id FROM showtimes WHERE starts_at >= $1)
             ORDER BY title"
        ))
        .bind(from)
        .fetch_all(&self.db.pool)
        .await?;
        Ok(movies)
    }

    async fn list_theaters(&self) -> StoreResult<Vec<Theater>> {
        let theaters = sqlx::query_as::<_, Theater>(
            "SELECT id, name, location, facilities FROM theaters ORDER BY name",
        )
        .fetch_all(&self.db.pool)
        .await?;
        Ok(theaters)
    }

    async fn insert_theaters(&self, theaters: Vec<NewTheater>) -> StoreResult<usize> {
        let mut tx = self.db.pool.begin().await?;
        for theater in &theaters {
            sqlx::query(
                "INSERT INTO theaters (id, name, location, facilities) VALUES ($1, $2, $3, $4)",
            )
            .bind(Uuid::new_v4())
            .bind(&theater.name)
            .bind(&theater.location)
            .bind(&theater.facilities)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(theaters.len())
    }

    async fn find_showtime(&self, id: Uuid) -> StoreResult<Option<Showtime>> {
        let showtime = sqlx::query_as::<_, Showtime>(&format!(
            "SELECT {SHOWTIME_COLUMNS} FROM showtimes WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db.pool)
        .await?;
        Ok(showtime)
    }

    async fn showtimes_on(&self, movie_id: Uuid, date: NaiveDate) -> StoreResult<Vec<Showtime>> {
        let (from, to) = day_window(date);
        let showtimes = sqlx::query_as::<_, Showtime>(&format!(
            "SELECT {SHOWTIME_COLUMNS} FROM showtimes
             WHERE movie_id = $1 AND starts_at >= $2 AND starts_at < $3
             ORDER BY starts_at, id"
        ))
        .bind(movie_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.db.pool)
        .await?;
        Ok(showtimes)
    }

    async fn upcoming_showtimes(&self, from: NaiveDateTime) -> StoreResult<Vec<Showtime>> {
        let showtimes = sqlx::query_as::<_, Showtime>(&format!(
            "SELECT {SHOWTIME_COLUMNS} FROM showtimes WHERE starts_at >= $1 ORDER BY starts_at, id"
        ))
        .bind(from)
        .fetch_all(&self.db.pool)
        .await?;
        Ok(showtimes)
    }

    async fn insert_showtimes(&self, showtimes: Vec<NewShowtime>) -> StoreResult<Vec<Showtime>> {
        let mut tx = self.db.pool.begin().await?;
        let mut created = Vec::with_capacity(showtimes.len());
        for showtime in showtimes {
            let row = sqlx::query_as::<_, Showtime>(&format!(
                "INSERT INTO showtimes (id, movie_id, theater_id, starts_at, screen,
                                        price_standard, price_vip)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)
                 RETURNING {SHOWTIME_COLUMNS}"
            ))
            .bind(Uuid::new_v4())
            .bind(showtime.movie_id)
            .bind(showtime.theater_id)
            .bind(showtime.starts_at)
            .bind(&showtime.screen)
            .bind(showtime.price_standard)
            .bind(showtime.price_vip)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    StoreError::Corrupt(format!(
                        "unknown movie {} or theater {}",
                        showtime.movie_id, showtime.theater_id
                    ))
                } else {
                    e.into()
                }
            })?;
            created.push(row);
        }
        tx.commit().await?;
        Ok(created)
    }

    async fn delete_showtime(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM showtimes WHERE id = $1")
            .bind(id)
            .execute(&self.db.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn confirmed_seats(&self, showtime_id: Uuid) -> StoreResult<Vec<SeatCode>> {
        let rows = sqlx::query_scalar::<_, String>(
            "SELECT UNNEST(seats) FROM bookings WHERE showtime_id = $1 AND status = 'confirmed'",
        )
        .bind(showtime_id)
        .fetch_all(&self.db.pool)
        .await?;

        rows.iter()
            .map(|s| {
                s.parse::<SeatCode>()
                    .map_err(|e| StoreError::Corrupt(format!("showtime {}: {}", showtime_id, e)))
            })
            .collect()
    }

    async fn insert_booking(&self, booking: NewBooking) -> StoreResult<Booking> {
        let id = Uuid::new_v4();
        let seats: Vec<String> = booking.seats.iter().map(|s| s.to_string()).collect();

        let mut tx = self.db.pool.begin().await?;

        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "INSERT INTO bookings (id, user_id, showtime_id, seats, total_price, status)
             VALUES ($1, $2, $3, $4, $5, 'confirmed')
             RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(id)
        .bind(booking.user_id)
        .bind(booking.showtime_id)
        .bind(&seats)
        .bind(booking.total_price)
        .fetch_one(&mut *tx)
        .await?;

        // По строке на место: уникальный ключ (showtime_id, seat_code) отсекает двойную продажу
        let assigned = sqlx::query(
            "INSERT INTO booking_seats (booking_id, showtime_id, seat_code)
             SELECT $1, $2, UNNEST($3::text[])",
        )
        .bind(id)
        .bind(booking.showtime_id)
        .bind(&seats)
        .execute(&mut *tx)
        .await;

        if let Err(e) = assigned {
            let _ = tx.rollback().await;
            if is_unique_violation(&e) {
                let mut taken = self.taken_among(booking.showtime_id, &seats).await?;
                if taken.is_empty() {
                    // дубликат внутри самой брони
                    taken = seats.clone();
                }
                return Err(StoreError::SeatsTaken(taken));
            }
            return Err(e.into());
        }

        tx.commit().await?;
        row.try_into()
    }

    async fn bookings_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.db.pool)
        .await?;
        rows.into_iter().map(Booking::try_from).collect()
    }

    async fn dashboard_stats(&self) -> StoreResult<DashboardStats> {
        let (bookings, revenue, movies) = sqlx::query_as::<_, (i64, i64, i64)>(
            "SELECT
                (SELECT COUNT(*) FROM bookings),
                (SELECT COALESCE(SUM(total_price), 0)::BIGINT FROM bookings WHERE status = 'confirmed'),
                (SELECT COUNT(*) FROM movies)",
        )
        .fetch_one(&self.db.pool)
        .await?;
        Ok(DashboardStats {
            bookings,
            revenue,
            movies,
        })
    }

    async fn find_favorite(&self, user_id: Uuid, movie_id: &str) -> StoreResult<Option<Favorite>> {
        let row = sqlx::query_as::<_, FavoriteRow>(
            "SELECT user_id, movie_id, movie, created_at FROM favorites
             WHERE user_id = $1 AND movie_id = $2",
        )
        .bind(user_id)
        .bind(movie_id)
        .fetch_optional(&self.db.pool)
        .await?;
        Ok(row.map(Favorite::from))
    }

    async fn insert_favorite(&self, favorite: Favorite) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO favorites (user_id, movie_id, movie, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(favorite.user_id)
        .bind(&favorite.movie_id)
        .bind(Json(&favorite.movie))
        .bind(favorite.created_at)
        .execute(&self.db.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Duplicate(format!("favorite {}", favorite.movie_id))
            } else {
                e.into()
            }
        })?;
        Ok(())
    }

    async fn delete_favorite(&self, user_id: Uuid, movie_id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND movie_id = $2")
            .bind(user_id)
            .bind(movie_id)
            .execute(&self.db.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn favorites_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Favorite>> {
        let rows = sqlx::query_as::<_, FavoriteRow>(
            "SELECT user_id, movie_id, movie, created_at FROM favorites
             WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.db.pool)
        .await?;
        Ok(rows.into_iter().map(Favorite::from).collect())
    }
}
