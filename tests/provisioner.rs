mod common;

use chrono::{NaiveTime, Timelike};
use rand::rngs::StdRng;
use rand::SeedableRng;
use uuid::Uuid;

use cinema_booking::services::provisioner::{generate_schedule, ShowtimeProvisioner, DAILY_SLOTS};
use cinema_booking::store::Store;

use common::{as_store, memory_store, seed_movie, seed_theaters, show_date};

#[test]
fn generated_showtimes_fall_on_slots_of_the_requested_day() {
    let mut rng = StdRng::seed_from_u64(7);
    let theaters: Vec<Uuid> = (0..7).map(|_| Uuid::new_v4()).collect();
    let schedule = generate_schedule(&mut rng, Uuid::new_v4(), &theaters, show_date());

    assert!(!schedule.is_empty());
    assert!(schedule.len() <= theaters.len() * DAILY_SLOTS.len());
    for showtime in &schedule {
        assert_eq!(showtime.starts_at.date(), show_date());
        let time = showtime.starts_at.time();
        assert!(DAILY_SLOTS
            .iter()
            .any(|(h, m)| time.hour() == *h && time.minute() == *m));
        assert!((180..=350).contains(&showtime.price_standard));
        assert!((400..=600).contains(&showtime.price_vip));
        assert_eq!(showtime.price_standard % 10, 0);
        assert_eq!(showtime.price_vip % 10, 0);

        let screen: u32 = showtime
            .screen
            .strip_prefix("Screen ")
            .and_then(|n| n.parse().ok())
            .expect("screen label");
        assert!((1..=5).contains(&screen));
    }
}

#[test]
fn same_seed_gives_same_schedule() {
    let movie = Uuid::new_v4();
    let theaters: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
    let a = generate_schedule(&mut StdRng::seed_from_u64(42), movie, &theaters, show_date());
    let b = generate_schedule(&mut StdRng::seed_from_u64(42), movie, &theaters, show_date());
    assert_eq!(a, b);
}

#[test]
fn no_theaters_no_schedule() {
    let mut rng = StdRng::seed_from_u64(1);
    assert!(generate_schedule(&mut rng, Uuid::new_v4(), &[], show_date()).is_empty());
}

#[tokio::test]
async fn provisioning_twice_returns_the_same_showtimes() {
    let store = memory_store();
    let movie = seed_movie(&store, "tt0133093").await;
    let theater_ids: Vec<Uuid> = seed_theaters(&store, 4).await.iter().map(|t| t.id).collect();
    let provisioner = ShowtimeProvisioner::with_seed(as_store(&store), 11);

    let first = provisioner
        .ensure_showtimes(movie.id, &theater_ids, show_date())
        .await
        .unwrap();
    assert!(!first.is_empty());

    let writes = store.write_attempts();
    let second = provisioner
        .ensure_showtimes(movie.id, &theater_ids, show_date())
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(store.write_attempts(), writes, "second call must not write");
    assert_eq!(
        store.showtimes_on(movie.id, show_date()).await.unwrap().len(),
        first.len()
    );
}

#[tokio::test]
async fn showtimes_on_other_days_do_not_count() {
    let store = memory_store();
    let movie = seed_movie(&store, "tt1375666").await;
    let theater_ids: Vec<Uuid> = seed_theaters(&store, 3).await.iter().map(|t| t.id).collect();
    let provisioner = ShowtimeProvisioner::with_seed(as_store(&store), 5);

    let today = provisioner
        .ensure_showtimes(movie.id, &theater_ids, show_date())
        .await
        .unwrap();
    let next_day = show_date().succ_opt().unwrap();
    let tomorrow = provisioner
        .ensure_showtimes(movie.id, &theater_ids, next_day)
        .await
        .unwrap();

    assert!(today.iter().all(|s| s.starts_at.date() == show_date()));
    assert!(tomorrow.iter().all(|s| s.starts_at.date() == next_day));
    assert!(tomorrow.iter().all(|s| !today.contains(s)));
}

#[tokio::test]
async fn zero_theaters_yield_empty_list() {
    let store = memory_store();
    let movie = seed_movie(&store, "tt0816692").await;
    let provisioner = ShowtimeProvisioner::with_seed(as_store(&store), 3);

    let showtimes = provisioner
        .ensure_showtimes(movie.id, &[], show_date())
        .await
        .unwrap();
    assert!(showtimes.is_empty());
}

#[tokio::test]
async fn persistence_failure_is_swallowed() {
    let store = memory_store();
    let movie = seed_movie(&store, "tt0468569").await;
    let theater_ids: Vec<Uuid> = seed_theaters(&store, 7).await.iter().map(|t| t.id).collect();
    store.fail_writes(true);
    let writes = store.write_attempts();

    let provisioner = ShowtimeProvisioner::with_seed(as_store(&store), 9);
    let showtimes = provisioner
        .ensure_showtimes(movie.id, &theater_ids, show_date())
        .await
        .expect("failure is logged, not returned");

    assert!(showtimes.is_empty());
    assert_eq!(store.write_attempts(), writes + 1);
}

#[tokio::test]
async fn existing_showtime_prevents_generation() {
    let store = memory_store();
    let movie = seed_movie(&store, "tt0110912").await;
    let theaters = seed_theaters(&store, 2).await;
    let existing = common::seed_showtime(&store, &movie, &theaters[0], 300, 500).await;
    let theater_ids: Vec<Uuid> = theaters.iter().map(|t| t.id).collect();

    let provisioner = ShowtimeProvisioner::with_seed(as_store(&store), 21);
    let showtimes = provisioner
        .ensure_showtimes(movie.id, &theater_ids, show_date())
        .await
        .unwrap();

    assert_eq!(showtimes, vec![existing]);
    assert_eq!(
        showtimes[0].starts_at.time(),
        NaiveTime::from_hms_opt(18, 30, 0).unwrap()
    );
}
