use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::models::NewUser;
use crate::store::StoreError;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "invalid email"))]
    pub email: String,
    #[validate(length(min = 6, max = 128, message = "password must be 6-128 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// POST /api/auth/signup
async fn signup(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let email = normalize_email(&req.email);
    let display_name = req
        .display_name
        .clone()
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

    // bcrypt медленный - не держим им рантайм
    let password = req.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| ApiError::internal(format!("hashing task failed: {e}")))?
        .map_err(|e| ApiError::internal(format!("hashing failed: {e}")))?;

    let user = state
        .store
        .insert_user(NewUser {
            email,
            password_hash,
            display_name,
        })
        .await
        .map_err(|e| match e {
            StoreError::Duplicate(_) => {
                ApiError::new(StatusCode::CONFLICT, "email_taken", "Email already registered")
            }
            other => other.into(),
        })?;

    let session = user.session();
    let token = state
        .cache
        .create_session(&session, state.config.booking.session_ttl_seconds)
        .await?;
    info!("User {} signed up", user.email);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "token": token, "user": user })),
    ))
}

// POST /api/auth/login
async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let invalid = || ApiError::unauthorized("Invalid email or password");
    let user = state
        .store
        .find_user_by_email(&normalize_email(&req.email))
        .await?
        .ok_or_else(invalid)?;

    let password = req.password.clone();
    let candidate = user.clone();
    let verified = tokio::task::spawn_blocking(move || candidate.verify_password(&password))
        .await
        .map_err(|e| ApiError::internal(format!("verification task failed: {e}")))?;
    if !verified {
        return Err(invalid());
    }

    let token = state
        .cache
        .create_session(&user.session(), state.config.booking.session_ttl_seconds)
        .await?;

    Ok(Json(json!({ "success": true, "token": token, "user": user })))
}

// POST /api/auth/logout
async fn logout(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<impl IntoResponse> {
    state.cache.invalidate_session(&user.token).await?;
    info!("User {} logged out", user.session.email);
    Ok(Json(json!({ "success": true })))
}

// GET /api/auth/me
async fn me(user: AuthUser) -> impl IntoResponse {
    Json(json!({ "success": true, "user": user.session }))
}
