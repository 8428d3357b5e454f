#[cfg(feature = "admin")]
pub mod admin;
pub mod auth;
pub mod bookings;
pub mod checkout;
pub mod favorites;
pub mod movies;
pub mod theaters;

use axum::Router;
use std::sync::Arc;

pub fn routes() -> Router<Arc<crate::AppState>> {
    let router = Router::new()
        .merge(auth::routes())
        .merge(theaters::routes())
        .merge(movies::routes())
        .merge(bookings::routes())
        .merge(checkout::routes())
        .merge(favorites::routes());

    #[cfg(feature = "admin")]
    let router = router.merge(admin::routes());

    router
}
