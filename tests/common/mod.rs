#![allow(dead_code)]

use chrono::{NaiveDate, NaiveTime};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use std::sync::Arc;
use uuid::Uuid;

use cinema_booking::config::{CircuitBreakerConfig, MetadataConfig};
use cinema_booking::models::{Movie, NewMovie, NewShowtime, NewTheater, Session, Showtime, Theater};
use cinema_booking::store::{MemoryStore, Store};

pub fn memory_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

pub fn as_store(store: &Arc<MemoryStore>) -> Arc<dyn Store> {
    store.clone()
}

pub fn session() -> Session {
    Session {
        user_id: Uuid::new_v4(),
        email: SafeEmail().fake(),
    }
}

pub fn show_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
}

pub async fn seed_movie(store: &Arc<MemoryStore>, external_id: &str) -> Movie {
    store
        .insert_movie(NewMovie {
            external_id: external_id.to_string(),
            title: Name().fake(),
            poster_url: None,
            backdrop_url: None,
            genres: vec!["Drama".to_string()],
            runtime_minutes: 120,
            release_date: None,
            rating: Some(7.5),
        })
        .await
        .unwrap()
}

pub async fn seed_theaters(store: &Arc<MemoryStore>, count: usize) -> Vec<Theater> {
    let theaters = (0..count)
        .map(|i| NewTheater {
            name: format!("Theater {}", i + 1),
            location: "New Delhi".to_string(),
            facilities: vec![],
        })
        .collect();
    store.insert_theaters(theaters).await.unwrap();
    store.list_theaters().await.unwrap()
}

pub async fn seed_showtime(
    store: &Arc<MemoryStore>,
    movie: &Movie,
    theater: &Theater,
    price_standard: i32,
    price_vip: i32,
) -> Showtime {
    let starts_at = show_date().and_time(NaiveTime::from_hms_opt(18, 30, 0).unwrap());
    store
        .insert_showtimes(vec![NewShowtime {
            movie_id: movie.id,
            theater_id: theater.id,
            starts_at,
            screen: "Screen 1".to_string(),
            price_standard,
            price_vip,
        }])
        .await
        .unwrap()
        .remove(0)
}

pub fn metadata_config(base_url: &str) -> (MetadataConfig, CircuitBreakerConfig) {
    (
        MetadataConfig {
            api_key: "test-key".to_string(),
            base_url: base_url.to_string(),
            timeout_seconds: 5,
        },
        CircuitBreakerConfig {
            failure_threshold: 5,
            timeout_seconds: 60,
        },
    )
}
