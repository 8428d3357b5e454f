//! Админка: статистика, фильмы и ручное управление расписанием.
//!
//! Доступна только администраторам (email из `ADMIN_EMAILS`).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};
use chrono::{Local, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ApiResult, BookingError};
use crate::middleware::AdminUser;
use crate::models::{NewMovie, NewShowtime};
use crate::store::StoreError;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/stats", get(dashboard_stats))
        .route("/admin/movies", get(list_movies).post(add_movie))
        .route("/admin/movies/{id}", delete(delete_movie))
        .route("/admin/metadata/{external_id}", get(lookup_metadata))
        .route("/admin/showtimes", get(list_showtimes).post(add_showtime))
        .route("/admin/showtimes/{id}", delete(delete_showtime))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddMovieRequest {
    /// Внешний id; без него фильм получает `custom-<timestamp>`.
    #[validate(length(min = 1, max = 64))]
    pub external_id: Option<String>,
    /// Без названия фильм импортируется из внешнего каталога по `external_id`.
    #[validate(length(min = 1, max = 300))]
    pub title: Option<String>,
    #[validate(url)]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[validate(range(min = 0, max = 1000))]
    pub runtime_minutes: Option<i32>,
    pub release_date: Option<NaiveDate>,
    #[validate(range(min = 0.0, max = 10.0))]
    pub rating: Option<f32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddShowtimeRequest {
    pub movie_id: Uuid,
    pub theater_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    #[validate(range(min = 1, max = 100_000))]
    pub price_standard: i32,
    #[validate(range(min = 1, max = 100_000))]
    pub price_vip: i32,
}

// GET /api/admin/stats
async fn dashboard_stats(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> ApiResult<impl IntoResponse> {
    let stats = state.store.dashboard_stats().await?;
    Ok(Json(json!({ "success": true, "stats": stats })))
}

// GET /api/admin/movies
async fn list_movies(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> ApiResult<impl IntoResponse> {
    let movies = state.store.list_movies().await?;
    Ok(Json(json!({ "success": true, "movies": movies })))
}

// POST /api/admin/movies
async fn add_movie(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Json(req): Json<AddMovieRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let movie = match (req.title, req.external_id) {
        (None, Some(external_id)) => state.catalog.ensure_movie(external_id.trim()).await?,
        (None, None) => return Err(ApiError::bad_request("title or external_id is required")),
        (Some(title), external_id) => {
            let external_id = external_id
                .map(|id| id.trim().to_string())
                .unwrap_or_else(|| format!("custom-{}", Utc::now().timestamp_millis()));
            let new_movie = NewMovie {
                external_id,
                title: title.trim().to_string(),
                backdrop_url: req.poster_url.clone(),
                poster_url: req.poster_url,
                genres: req
                    .genres
                    .iter()
                    .map(|g| g.trim().to_string())
                    .filter(|g| !g.is_empty())
                    .collect(),
                runtime_minutes: req.runtime_minutes.unwrap_or(0),
                release_date: req.release_date,
                rating: req.rating,
            };
            state.store.insert_movie(new_movie).await.map_err(|e| match e {
                StoreError::Duplicate(_) => {
                    ApiError::new(StatusCode::CONFLICT, "duplicate_movie", "Movie already exists")
                }
                other => other.into(),
            })?
        }
    };

    info!("Admin {} added movie {} ({})", admin.email, movie.title, movie.external_id);
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "movie": movie }))))
}

// DELETE /api/admin/movies/{id}
async fn delete_movie(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    if !state.store.delete_movie(id).await? {
        return Err(BookingError::MovieNotFound.into());
    }
    info!("Admin {} deleted movie {}", admin.email, id);
    Ok(Json(json!({ "success": true })))
}

// GET /api/admin/metadata/{external_id} - автозаполнение формы
async fn lookup_metadata(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(external_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let details = state.metadata.fetch(&external_id).await?;
    Ok(Json(json!({ "success": true, "movie": details })))
}

// GET /api/admin/showtimes
async fn list_showtimes(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> ApiResult<impl IntoResponse> {
    let showtimes = state
        .store
        .upcoming_showtimes(Local::now().naive_local())
        .await?;
    Ok(Json(json!({ "success": true, "showtimes": showtimes })))
}

// POST /api/admin/showtimes
async fn add_showtime(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Json(req): Json<AddShowtimeRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let new_showtime = NewShowtime {
        movie_id: req.movie_id,
        theater_id: req.theater_id,
        starts_at: req.date.and_time(req.time),
        screen: state.provisioner.pick_screen(),
        price_standard: req.price_standard,
        price_vip: req.price_vip,
    };
    let created = state
        .store
        .insert_showtimes(vec![new_showtime])
        .await
        .map_err(|e| match e {
            StoreError::Corrupt(msg) => ApiError::bad_request(msg),
            other => other.into(),
        })?;

    info!("Admin {} scheduled showtime for movie {}", admin.email, req.movie_id);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "showtimes": created })),
    ))
}

// DELETE /api/admin/showtimes/{id}
async fn delete_showtime(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    if !state.store.delete_showtime(id).await? {
        return Err(BookingError::ShowtimeNotFound.into());
    }
    state.cache.invalidate_seats(id).await;
    info!("Admin {} cancelled showtime {}", admin.email, id);
    Ok(Json(json!({ "success": true })))
}
