use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

use crate::error::{ApiError, ApiResult};
use crate::metadata_client::MetadataError;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/movies/search", get(search_movies))
        .route("/movies/local", get(search_local))
        .route("/movies/now-showing", get(now_showing))
        .route("/movies/{external_id}", get(movie_details))
        .route("/movies/{external_id}/showtimes", get(showtimes))
        .route("/movies/{external_id}/showtimes/first", get(first_showtime))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

/// Дата из запроса `YYYY-MM-DD`, по умолчанию сегодня.
fn requested_date(query: &DateQuery) -> ApiResult<NaiveDate> {
    match query.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| ApiError::bad_request("date must be YYYY-MM-DD")),
        None => Ok(Local::now().date_naive()),
    }
}

// GET /api/movies/search?query=&page=
async fn search_movies(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<impl IntoResponse> {
    let query = params.query.unwrap_or_default();
    let page = params.page.unwrap_or(1).max(1);

    if let Some(movies) = state.cache.get_cached_search(&query, page).await {
        return Ok((
            [(header::HeaderName::from_static("x-cache"), "HIT")],
            Json(json!({ "success": true, "movies": movies, "count": movies.len() })),
        ));
    }

    let movies = state.metadata.search(&query, page).await?;
    state.cache.cache_search_result(&query, page, &movies).await;

    Ok((
        [(header::HeaderName::from_static("x-cache"), "MISS")],
        Json(json!({ "success": true, "movies": movies, "count": movies.len() })),
    ))
}

// GET /api/movies/local?query=
async fn search_local(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<impl IntoResponse> {
    let movies = state
        .catalog
        .search_local(params.query.as_deref().unwrap_or_default())
        .await?;
    Ok(Json(json!({ "success": true, "movies": movies })))
}

// GET /api/movies/now-showing
async fn now_showing(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let movies = state.catalog.now_showing(Local::now().naive_local()).await?;
    Ok(Json(json!({ "success": true, "movies": movies })))
}

// GET /api/movies/{external_id}
async fn movie_details(
    State(state): State<Arc<AppState>>,
    Path(external_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    match state.metadata.fetch(&external_id).await {
        Ok(details) => Ok(Json(json!({ "success": true, "source": "metadata", "movie": details }))),
        Err(MetadataError::NotFound(id)) => Err(ApiError::not_found(format!("movie {id} not found"))),
        Err(e) => {
            // Внешний каталог недоступен - отдаём то, что есть локально
            warn!("Metadata fetch failed for {}: {}", external_id, e);
            match state.store.find_movie_by_external_id(&external_id).await? {
                Some(movie) => Ok(Json(json!({ "success": true, "source": "local", "movie": movie }))),
                None => Err(e.into()),
            }
        }
    }
}

// GET /api/movies/{external_id}/showtimes?date=YYYY-MM-DD
async fn showtimes(
    State(state): State<Arc<AppState>>,
    Path(external_id): Path<String>,
    Query(params): Query<DateQuery>,
) -> ApiResult<impl IntoResponse> {
    let date = requested_date(&params)?;
    let showtimes = state.catalog.showtimes_for(&external_id, date).await?;
    Ok(Json(json!({
        "success": true,
        "date": date,
        "showtimes": showtimes,
        "count": showtimes.len(),
    })))
}

// GET /api/movies/{external_id}/showtimes/first?date=YYYY-MM-DD
async fn first_showtime(
    State(state): State<Arc<AppState>>,
    Path(external_id): Path<String>,
    Query(params): Query<DateQuery>,
) -> ApiResult<impl IntoResponse> {
    let date = requested_date(&params)?;
    let showtime = state.catalog.default_showtime(&external_id, date).await?;
    Ok(Json(json!({ "success": true, "showtime": showtime })))
}
