use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::error::BookingError;
use crate::models::{Favorite, MovieSnapshot, Session};
use crate::store::{Store, StoreError};

pub struct FavoritesService {
    store: Arc<dyn Store>,
}

impl FavoritesService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Добавляет фильм в избранное или убирает его. `true` - фильм теперь в избранном.
    pub async fn toggle(
        &self,
        session: Option<&Session>,
        movie: MovieSnapshot,
    ) -> Result<bool, BookingError> {
        let session = session.ok_or(BookingError::NotAuthenticated)?;
        let movie_id = movie.external_id.clone();

        if self.store.delete_favorite(session.user_id, &movie_id).await? {
            info!("User {} removed {} from favorites", session.user_id, movie_id);
            return Ok(false);
        }

        let favorite = Favorite {
            user_id: session.user_id,
            movie_id: movie_id.clone(),
            movie,
            created_at: Utc::now(),
        };
        match self.store.insert_favorite(favorite).await {
            Ok(()) => {
                info!("User {} added {} to favorites", session.user_id, movie_id);
                Ok(true)
            }
            // Двойной клик: запись уже есть
            Err(StoreError::Duplicate(_)) => Ok(true),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn is_favorite(
        &self,
        session: Option<&Session>,
        movie_id: &str,
    ) -> Result<bool, BookingError> {
        let session = session.ok_or(BookingError::NotAuthenticated)?;
        Ok(self.store.find_favorite(session.user_id, movie_id).await?.is_some())
    }

    pub async fn list(&self, session: Option<&Session>) -> Result<Vec<Favorite>, BookingError> {
        let session = session.ok_or(BookingError::NotAuthenticated)?;
        Ok(self.store.favorites_for_user(session.user_id).await?)
    }
}
