use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::metadata_client::MetadataError;
use crate::services::seat_map::SelectionRejected;
use crate::store::StoreError;

/// Исходы бронирования и связанных операций. Ни один не фатален для
/// процесса: пользователь всегда может повторить попытку.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("please sign in to book tickets")]
    NotAuthenticated,

    #[error("no showtimes available for this date")]
    NoShowtimesAvailable,

    #[error("seats already booked: {}", .0.join(", "))]
    SeatConflict(Vec<String>),

    #[error("booking failed, please try again: {0}")]
    SubmissionFailed(StoreError),

    #[error("movie data unavailable: {0}")]
    MetadataUnavailable(#[from] MetadataError),

    #[error("select at least one seat")]
    EmptySelection,

    #[error("you can only book up to {0} seats")]
    TooManySeats(usize),

    #[error("seat {0} selected twice")]
    DuplicateSeat(String),

    #[error("invalid seat: {0}")]
    InvalidSeat(String),

    #[error(transparent)]
    Rejected(#[from] SelectionRejected),

    #[error("showtime not found")]
    ShowtimeNotFound,

    #[error("movie not found")]
    MovieNotFound,

    #[error("price mismatch: expected {expected}, submitted {submitted}")]
    PriceMismatch { expected: i32, submitted: i32 },

    #[error("checkout expired, please select seats again")]
    CheckoutExpired,

    #[error("unknown coupon code {0:?}")]
    InvalidCoupon(String),

    #[error("invalid checkout state: {0}")]
    InvalidState(&'static str),

    #[error("forbidden")]
    Forbidden,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BookingError {
    pub fn status(&self) -> StatusCode {
        match self {
            BookingError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            BookingError::NoShowtimesAvailable
            | BookingError::ShowtimeNotFound
            | BookingError::MovieNotFound => StatusCode::NOT_FOUND,
            BookingError::SeatConflict(_) | BookingError::InvalidState(_) => StatusCode::CONFLICT,
            BookingError::SubmissionFailed(_) | BookingError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            BookingError::MetadataUnavailable(MetadataError::NotFound(_)) => StatusCode::NOT_FOUND,
            BookingError::MetadataUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            BookingError::EmptySelection
            | BookingError::TooManySeats(_)
            | BookingError::DuplicateSeat(_)
            | BookingError::InvalidSeat(_)
            | BookingError::InvalidCoupon(_)
            | BookingError::Rejected(_) => StatusCode::BAD_REQUEST,
            BookingError::PriceMismatch { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            BookingError::CheckoutExpired => StatusCode::GONE,
            BookingError::Forbidden => StatusCode::FORBIDDEN,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            BookingError::NotAuthenticated => "not_authenticated",
            BookingError::NoShowtimesAvailable => "no_showtimes_available",
            BookingError::SeatConflict(_) => "seat_conflict",
            BookingError::SubmissionFailed(_) => "submission_failed",
            BookingError::MetadataUnavailable(_) => "metadata_unavailable",
            BookingError::EmptySelection => "empty_selection",
            BookingError::TooManySeats(_) => "too_many_seats",
            BookingError::DuplicateSeat(_) => "duplicate_seat",
            BookingError::InvalidSeat(_) => "invalid_seat",
            BookingError::Rejected(_) => "selection_rejected",
            BookingError::ShowtimeNotFound => "showtime_not_found",
            BookingError::MovieNotFound => "movie_not_found",
            BookingError::PriceMismatch { .. } => "price_mismatch",
            BookingError::CheckoutExpired => "checkout_expired",
            BookingError::InvalidCoupon(_) => "invalid_coupon",
            BookingError::InvalidState(_) => "invalid_state",
            BookingError::Forbidden => "forbidden",
            BookingError::Store(_) => "storage_error",
        }
    }
}

/// Ошибка HTTP-слоя: статус + JSON `{ success: false, code, error }`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "not_authenticated", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        let status = err.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", err);
        }
        let message = match &err {
            // Детали хранилища наружу не отдаём
            BookingError::SubmissionFailed(_) => "Booking failed, please try again".to_string(),
            BookingError::Store(_) => "Storage error".to_string(),
            BookingError::MetadataUnavailable(MetadataError::NotFound(id)) => {
                format!("movie {id} not found")
            }
            // Текст ошибок внешнего API остаётся в логах
            BookingError::MetadataUnavailable(_) => {
                "Movie data is temporarily unavailable".to_string()
            }
            other => other.to_string(),
        };
        Self::new(status, err.code(), message)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        BookingError::Store(err).into()
    }
}

impl From<MetadataError> for ApiError {
    fn from(err: MetadataError) -> Self {
        BookingError::MetadataUnavailable(err).into()
    }
}

impl From<redis::RedisError> for ApiError {
    fn from(err: redis::RedisError) -> Self {
        tracing::error!("Redis error: {}", err);
        ApiError::internal("Cache unavailable")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "success": false,
            "code": self.code,
            "error": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
