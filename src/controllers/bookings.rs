use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{ApiResult, BookingError};
use crate::middleware::MaybeSession;
use crate::services::booking::BookingRequest;
use crate::services::seat_map::BookedSeats;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/showtimes/{id}/seats", get(get_seats))
        .route("/bookings", get(get_user_bookings).post(create_booking))
}

/* ---------- helpers ---------- */

/// Снимок занятых мест: сначала кеш, при промахе - хранилище.
pub(crate) async fn booked_snapshot(
    state: &AppState,
    showtime_id: Uuid,
) -> Result<BookedSeats, BookingError> {
    if let Some(booked) = state.cache.get_booked_seats(showtime_id).await {
        return Ok(booked);
    }
    let booked = state.bookings.booked_seats(showtime_id).await?;
    state.cache.save_booked_seats(showtime_id, &booked).await;
    Ok(booked)
}

/* ---------- SEATS ---------- */

// GET /api/showtimes/{id}/seats
async fn get_seats(
    State(state): State<Arc<AppState>>,
    Path(showtime_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let showtime = state.bookings.find_showtime(showtime_id).await?;
    let booked = booked_snapshot(&state, showtime_id).await?;
    let seat_map = state.bookings.seat_map(showtime_id, &booked).await?;

    Ok(Json(json!({
        "success": true,
        "showtime": showtime,
        "max_selectable": state.bookings.max_seats(),
        "seat_map": seat_map,
    })))
}

/* ---------- BOOKINGS ---------- */

// POST /api/bookings
async fn create_booking(
    State(state): State<Arc<AppState>>,
    session: MaybeSession,
    Json(req): Json<BookingRequest>,
) -> ApiResult<impl IntoResponse> {
    let showtime_id = req.showtime_id;
    let result = state.bookings.submit_booking(session.as_ref(), req).await;

    // Конфликт означает, что кешированный снимок устарел
    if matches!(result, Ok(_) | Err(BookingError::SeatConflict(_))) {
        state.cache.invalidate_seats(showtime_id).await;
    }

    let booking = result?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "booking": booking })),
    ))
}

// GET /api/bookings
async fn get_user_bookings(
    State(state): State<Arc<AppState>>,
    session: MaybeSession,
) -> ApiResult<impl IntoResponse> {
    let bookings = state.bookings.user_bookings(session.as_ref()).await?;
    Ok(Json(json!({ "success": true, "data": bookings })))
}
