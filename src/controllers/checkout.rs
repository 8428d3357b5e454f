use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::cache::HeldCheckout;
use crate::error::{ApiResult, BookingError};
use crate::middleware::AuthUser;
use crate::services::checkout::Checkout;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/checkout", post(start_checkout))
        .route("/checkout/{id}/pay", post(pay_checkout))
}

#[derive(Debug, Deserialize)]
pub struct StartCheckoutRequest {
    pub showtime_id: Uuid,
    pub seats: Vec<String>,
    pub coupon: Option<String>,
}

// POST /api/checkout
async fn start_checkout(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<StartCheckoutRequest>,
) -> ApiResult<impl IntoResponse> {
    let now = Utc::now();
    let mut checkout = Checkout::start(
        &state.bookings,
        req.showtime_id,
        &req.seats,
        state.checkout_hold(),
        now,
    )
    .await?;
    if let Some(code) = req.coupon.as_deref().filter(|c| !c.trim().is_empty()) {
        checkout.apply_coupon(code)?;
    }

    let hold = checkout
        .hold()
        .cloned()
        .ok_or(BookingError::InvalidState("nothing to pay for"))?;
    let ttl = hold.remaining(now).num_seconds().max(1) as u64;
    state
        .cache
        .save_checkout(
            &HeldCheckout {
                user_id: user.session.user_id,
                hold: hold.clone(),
            },
            ttl,
        )
        .await?;
    info!(
        "Checkout {} started by {}: {} seats, due {}",
        hold.id,
        user.session.email,
        hold.seats.len(),
        hold.amount_due
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "checkout": hold, "expires_in_seconds": ttl })),
    ))
}

// POST /api/checkout/{id}/pay
async fn pay_checkout(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(checkout_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let now = Utc::now();
    let held = state
        .cache
        .take_checkout(checkout_id)
        .await?
        .ok_or(BookingError::CheckoutExpired)?;

    if held.user_id != user.session.user_id {
        // Чужой заказ: возвращаем его на место
        let ttl = held.hold.remaining(now).num_seconds().max(1) as u64;
        state.cache.save_checkout(&held, ttl).await?;
        return Err(BookingError::Forbidden.into());
    }
    if held.hold.is_expired(now) {
        return Err(BookingError::CheckoutExpired.into());
    }

    let hold = held.hold;
    let result = state
        .bookings
        .submit_booking(Some(&user.session), hold.to_request())
        .await;
    if matches!(result, Ok(_) | Err(BookingError::SeatConflict(_))) {
        state.cache.invalidate_seats(hold.showtime_id).await;
    }
    let booking = result?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "booking": booking,
            "amount_paid": hold.amount_due,
            "coupon": hold.coupon,
        })),
    ))
}
