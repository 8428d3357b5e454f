use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

use crate::error::ApiResult;
use crate::middleware::MaybeSession;
use crate::models::MovieSnapshot;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/favorites", get(list_favorites))
        .route("/favorites/toggle", post(toggle_favorite))
        .route("/favorites/{movie_id}", get(is_favorite))
}

// GET /api/favorites
async fn list_favorites(
    State(state): State<Arc<AppState>>,
    session: MaybeSession,
) -> ApiResult<impl IntoResponse> {
    let favorites = state.favorites.list(session.as_ref()).await?;
    Ok(Json(json!({ "success": true, "favorites": favorites })))
}

// POST /api/favorites/toggle
async fn toggle_favorite(
    State(state): State<Arc<AppState>>,
    session: MaybeSession,
    Json(movie): Json<MovieSnapshot>,
) -> ApiResult<impl IntoResponse> {
    let movie_id = movie.external_id.clone();
    let favorite = state.favorites.toggle(session.as_ref(), movie).await?;
    Ok(Json(json!({ "success": true, "movie_id": movie_id, "favorite": favorite })))
}

// GET /api/favorites/{movie_id}
async fn is_favorite(
    State(state): State<Arc<AppState>>,
    session: MaybeSession,
    Path(movie_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let favorite = state.favorites.is_favorite(session.as_ref(), &movie_id).await?;
    Ok(Json(json!({ "success": true, "movie_id": movie_id, "favorite": favorite })))
}
