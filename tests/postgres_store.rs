//! Проверки `PgStore` на живой базе. Без `DATABASE_URL` тесты ничего не делают.

mod common;

use chrono::NaiveTime;
use fake::faker::internet::en::SafeEmail;
use fake::Fake;
use uuid::Uuid;

use cinema_booking::config::DatabaseConfig;
use cinema_booking::database::Database;
use cinema_booking::models::{
    Movie, NewBooking, NewMovie, NewShowtime, NewTheater, NewUser, SeatCode, Showtime,
};
use cinema_booking::store::{PgStore, Store, StoreError};

use common::show_date;

async fn pg_store() -> Option<PgStore> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let db = Database::connect(&DatabaseConfig {
        url: Some(url),
        pool_size: 2,
    })
    .await
    .unwrap();
    db.migrate().await.unwrap();
    Some(PgStore::new(db))
}

async fn fresh_showtime(store: &PgStore) -> (Movie, Showtime) {
    let tag = Uuid::new_v4();
    let movie = store
        .insert_movie(NewMovie {
            external_id: format!("test-{tag}"),
            title: format!("Seat test {tag}"),
            poster_url: None,
            backdrop_url: None,
            genres: vec![],
            runtime_minutes: 100,
            release_date: None,
            rating: None,
        })
        .await
        .unwrap();

    let theater_name = format!("Theater {tag}");
    store
        .insert_theaters(vec![NewTheater {
            name: theater_name.clone(),
            location: "New Delhi".to_string(),
            facilities: vec![],
        }])
        .await
        .unwrap();
    let theater = store
        .list_theaters()
        .await
        .unwrap()
        .into_iter()
        .find(|t| t.name == theater_name)
        .unwrap();

    let showtime = store
        .insert_showtimes(vec![NewShowtime {
            movie_id: movie.id,
            theater_id: theater.id,
            starts_at: show_date().and_time(NaiveTime::from_hms_opt(21, 30, 0).unwrap()),
            screen: "Screen 2".to_string(),
            price_standard: 200,
            price_vip: 450,
        }])
        .await
        .unwrap()
        .remove(0);
    (movie, showtime)
}

async fn user_id(store: &PgStore) -> Uuid {
    store
        .insert_user(NewUser {
            email: SafeEmail().fake(),
            password_hash: "not-a-real-hash".to_string(),
            display_name: "Viewer".to_string(),
        })
        .await
        .unwrap()
        .id
}

fn seats(codes: &[&str]) -> Vec<SeatCode> {
    codes.iter().map(|c| c.parse().unwrap()).collect()
}

#[tokio::test]
async fn overlapping_booking_hits_seat_constraint_and_rolls_back() {
    let Some(store) = pg_store().await else {
        return;
    };
    let (_, showtime) = fresh_showtime(&store).await;

    store
        .insert_booking(NewBooking {
            user_id: user_id(&store).await,
            showtime_id: showtime.id,
            seats: seats(&["C3", "C4"]),
            total_price: 400,
        })
        .await
        .unwrap();

    let rival = user_id(&store).await;
    let result = store
        .insert_booking(NewBooking {
            user_id: rival,
            showtime_id: showtime.id,
            seats: seats(&["C4", "C5"]),
            total_price: 400,
        })
        .await;
    match result {
        Err(StoreError::SeatsTaken(taken)) => assert_eq!(taken, vec!["C4".to_string()]),
        other => panic!("expected seats taken, got {other:?}"),
    }

    // Откат: ни брони, ни места C5 не осталось
    assert!(store.bookings_for_user(rival).await.unwrap().is_empty());
    let confirmed = store.confirmed_seats(showtime.id).await.unwrap();
    assert_eq!(confirmed.len(), 2);
    assert!(!confirmed.contains(&"C5".parse().unwrap()));

    // C5 по-прежнему можно купить
    store
        .insert_booking(NewBooking {
            user_id: rival,
            showtime_id: showtime.id,
            seats: seats(&["C5"]),
            total_price: 200,
        })
        .await
        .unwrap();
}
