pub mod cache;
pub mod config;
pub mod controllers;
pub mod database;
pub mod error;
pub mod metadata_client;
pub mod middleware;
pub mod models;
pub mod redis_client;
pub mod services;
pub mod store;

use chrono::Duration;
use std::sync::Arc;
use tokio::task;
use tracing::{error, info};

use crate::config::StorageBackend;
use crate::services::seat_map::{SeatLayout, DEFAULT_ROWS, DEFAULT_SEATS_PER_SIDE};
use crate::store::{MemoryStore, PgStore, Store};

// Shared state для всего приложения
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub cache: cache::CacheService,
    pub config: config::Config,
    pub metadata: Arc<metadata_client::MetadataClient>,
    pub provisioner: Arc<services::ShowtimeProvisioner>,
    pub catalog: services::CatalogService,
    pub bookings: services::BookingService,
    pub favorites: services::FavoritesService,
}

impl AppState {
    pub async fn new(config: config::Config) -> anyhow::Result<Arc<Self>> {
        let store: Arc<dyn Store> = match config.storage.backend {
            StorageBackend::Postgres => {
                let db = database::Database::connect(&config.database).await?;
                db.migrate().await?;
                Arc::new(PgStore::new(db))
            }
            StorageBackend::Memory => {
                info!("Using in-memory storage, data is lost on restart");
                Arc::new(MemoryStore::new())
            }
        };

        let redis = redis_client::RedisClient::new(&config.redis.url).await?;
        info!("Redis connected");
        let cache = cache::CacheService::new(redis, config.cache.clone());

        let metadata = Arc::new(metadata_client::MetadataClient::from_config(
            &config.metadata,
            &config.circuit_breaker,
        )?);
        let provisioner = Arc::new(services::ShowtimeProvisioner::new(store.clone()));
        let layout = SeatLayout::new(DEFAULT_ROWS, DEFAULT_SEATS_PER_SIDE);

        let state = Arc::new(Self {
            catalog: services::CatalogService::new(
                store.clone(),
                metadata.clone(),
                provisioner.clone(),
            ),
            bookings: services::BookingService::new(
                store.clone(),
                layout,
                config.booking.max_seats_per_booking,
            ),
            favorites: services::FavoritesService::new(store.clone()),
            store,
            cache,
            config,
            metadata,
            provisioner,
        });

        if state.config.features.seed_theaters {
            let state_for_bg = state.clone();
            task::spawn(async move {
                // Справочник кинотеатров заполняем в фоне
                if let Err(e) = state_for_bg.catalog.seed_theaters().await {
                    error!("Theater seeding failed: {}", e);
                }
            });
        }

        Ok(state)
    }

    pub fn checkout_hold(&self) -> Duration {
        Duration::seconds(self.config.booking.checkout_hold_seconds)
    }
}
