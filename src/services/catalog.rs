//! Каталог: фильмы, кинотеатры и расписание.

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::BookingError;
use crate::metadata_client::MetadataClient;
use crate::models::theater::default_theaters;
use crate::models::{Movie, ShowtimeListing};
use crate::services::provisioner::ShowtimeProvisioner;
use crate::store::{Store, StoreError, StoreResult};

pub const LOCAL_SEARCH_LIMIT: i64 = 10;

pub struct CatalogService {
    store: Arc<dyn Store>,
    metadata: Arc<MetadataClient>,
    provisioner: Arc<ShowtimeProvisioner>,
}

impl CatalogService {
    pub fn new(
        store: Arc<dyn Store>,
        metadata: Arc<MetadataClient>,
        provisioner: Arc<ShowtimeProvisioner>,
    ) -> Self {
        Self {
            store,
            metadata,
            provisioner,
        }
    }

    /// Фильм из локального каталога; если его там нет - импорт из внешнего.
    pub async fn ensure_movie(&self, external_id: &str) -> Result<Movie, BookingError> {
        if let Some(movie) = self.store.find_movie_by_external_id(external_id).await? {
            return Ok(movie);
        }

        let details = self.metadata.fetch(external_id).await?;
        match self.store.insert_movie(details.to_new_movie()).await {
            Ok(movie) => {
                info!("Imported movie {} ({})", movie.title, movie.external_id);
                Ok(movie)
            }
            // Параллельный запрос успел вставить фильм раньше
            Err(StoreError::Duplicate(_)) => self
                .store
                .find_movie_by_external_id(external_id)
                .await?
                .ok_or(BookingError::MovieNotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Заполняет пустой справочник кинотеатров.
    pub async fn seed_theaters(&self) -> StoreResult<usize> {
        if !self.store.list_theaters().await?.is_empty() {
            return Ok(0);
        }
        let inserted = self.store.insert_theaters(default_theaters()).await?;
        info!("Seeded {} theaters", inserted);
        Ok(inserted)
    }

    /// Сеансы фильма на дату; при необходимости расписание создаётся.
    pub async fn showtimes_for(
        &self,
        external_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<ShowtimeListing>, BookingError> {
        let movie = self.ensure_movie(external_id).await?;
        let theaters = self.store.list_theaters().await?;
        if theaters.is_empty() {
            warn!("No theaters configured, nothing to schedule for {}", external_id);
        }
        let theater_ids: Vec<Uuid> = theaters.iter().map(|t| t.id).collect();

        let showtimes = self
            .provisioner
            .ensure_showtimes(movie.id, &theater_ids, date)
            .await?;

        let by_id: HashMap<Uuid, _> = theaters.into_iter().map(|t| (t.id, t)).collect();
        Ok(showtimes
            .into_iter()
            .map(|showtime| ShowtimeListing {
                theater: by_id.get(&showtime.theater_id).cloned(),
                showtime,
            })
            .collect())
    }

    /// Первый сеанс дня - когда на схему зала пришли без выбранного сеанса.
    pub async fn default_showtime(
        &self,
        external_id: &str,
        date: NaiveDate,
    ) -> Result<ShowtimeListing, BookingError> {
        self.showtimes_for(external_id, date)
            .await?
            .into_iter()
            .next()
            .ok_or(BookingError::NoShowtimesAvailable)
    }

    pub async fn now_showing(&self, now: NaiveDateTime) -> StoreResult<Vec<Movie>> {
        self.store.movies_with_showtimes_from(now).await
    }

    pub async fn search_local(&self, query: &str) -> StoreResult<Vec<Movie>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        self.store.search_movies(query, LOCAL_SEARCH_LIMIT).await
    }
}
