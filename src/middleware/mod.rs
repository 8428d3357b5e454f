use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::Session;

/// Bearer-токен из заголовка Authorization.
pub fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

async fn resolve_session(
    parts: &Parts,
    state: &Arc<crate::AppState>,
) -> Result<Option<(String, Session)>, ApiError> {
    let Some(token) = bearer_token(parts) else {
        return Ok(None);
    };
    let session = state.cache.get_session(token).await?;
    Ok(session.map(|s| (token.to_string(), s)))
}

/// Обязательная сессия: без неё 401.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub token: String,
    pub session: Session,
}

impl FromRequestParts<Arc<crate::AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>,
    ) -> Result<Self, Self::Rejection> {
        let (token, session) = resolve_session(parts, state)
            .await?
            .ok_or_else(|| ApiError::unauthorized("Please sign in"))?;
        Ok(AuthUser { token, session })
    }
}

/// Необязательная сессия. Решение "можно ли без входа" принимает сервис,
/// а не экстрактор.
#[derive(Debug, Clone)]
pub struct MaybeSession(pub Option<Session>);

impl MaybeSession {
    pub fn as_ref(&self) -> Option<&Session> {
        self.0.as_ref()
    }
}

impl FromRequestParts<Arc<crate::AppState>> for MaybeSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>,
    ) -> Result<Self, Self::Rejection> {
        let session = resolve_session(parts, state).await?;
        Ok(MaybeSession(session.map(|(_, s)| s)))
    }
}

/// Администратор: email сессии есть в ADMIN_EMAILS.
#[cfg(feature = "admin")]
#[derive(Debug, Clone)]
pub struct AdminUser(pub Session);

#[cfg(feature = "admin")]
impl FromRequestParts<Arc<crate::AppState>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !state.config.admin.is_admin(&user.session.email) {
            tracing::warn!("Non-admin {} tried to access admin API", user.session.email);
            return Err(crate::error::BookingError::Forbidden.into());
        }
        Ok(AdminUser(user.session))
    }
}
