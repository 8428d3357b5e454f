use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use std::sync::Arc;

use crate::error::ApiResult;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/theaters", get(list_theaters))
}

// GET /api/theaters
async fn list_theaters(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let theaters = state.store.list_theaters().await?;
    Ok(Json(json!({ "success": true, "theaters": theaters })))
}
