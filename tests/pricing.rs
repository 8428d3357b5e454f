use chrono::NaiveDate;
use proptest::prelude::*;
use uuid::Uuid;

use cinema_booking::models::{SeatCode, Showtime, Tier};
use cinema_booking::services::pricing::{derive_price, PriceTable};

fn showtime(price_standard: i32, price_vip: i32) -> Showtime {
    Showtime {
        id: Uuid::new_v4(),
        movie_id: Uuid::new_v4(),
        theater_id: Uuid::new_v4(),
        starts_at: NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(18, 30, 0)
            .unwrap(),
        screen: "Screen 2".to_string(),
        price_standard,
        price_vip,
    }
}

proptest! {
    #[test]
    fn price_is_deterministic(key in ".*") {
        prop_assert_eq!(derive_price(&key, Tier::Standard), derive_price(&key, Tier::Standard));
        prop_assert_eq!(derive_price(&key, Tier::Vip), derive_price(&key, Tier::Vip));
    }

    #[test]
    fn standard_price_stays_in_range(key in ".+") {
        let price = derive_price(&key, Tier::Standard);
        prop_assert!((180..=320).contains(&price), "price {} out of range", price);
        prop_assert_eq!(price % 10, 0);
    }

    #[test]
    fn vip_price_stays_in_range(key in ".+") {
        let price = derive_price(&key, Tier::Vip);
        prop_assert!((350..=600).contains(&price), "price {} out of range", price);
        prop_assert_eq!(price % 10, 0);
    }

    #[test]
    fn imdb_style_keys_price_in_range(id in 0u32..10_000_000) {
        let key = format!("tt{:07}", id);
        let table = PriceTable::derived(&key);
        prop_assert!(table.standard >= 180 && table.standard <= 320);
        prop_assert!(table.vip >= 350 && table.vip <= 600);
    }
}

#[test]
fn empty_key_falls_back_to_defaults() {
    assert_eq!(derive_price("", Tier::Standard), 250);
    assert_eq!(derive_price("", Tier::Vip), 400);
}

#[test]
fn non_ascii_keys_are_hashed() {
    let price = derive_price("Амели", Tier::Standard);
    assert!((180..=320).contains(&price));
    assert_eq!(price % 10, 0);
}

#[test]
fn showtime_prices_win_over_derived() {
    let table = PriceTable::for_showtime(&showtime(210, 460), "tt0133093");
    assert_eq!(table, PriceTable { standard: 210, vip: 460 });
}

#[test]
fn placeholder_showtime_prices_are_derived() {
    let key = "tt0133093";
    let derived = PriceTable::derived(key);
    assert_eq!(PriceTable::for_showtime(&showtime(250, 450), key), derived);
    assert_eq!(PriceTable::for_showtime(&showtime(0, 0), key), derived);
}

#[test]
fn missing_vip_price_is_derived() {
    let key = "tt1375666";
    let table = PriceTable::for_showtime(&showtime(300, 0), key);
    assert_eq!(table.standard, 300);
    assert_eq!(table.vip, derive_price(key, Tier::Vip));
}

#[test]
fn total_sums_per_tier() {
    let table = PriceTable { standard: 210, vip: 460 };
    let seats: Vec<SeatCode> = ["A3", "F1", "G18"].iter().map(|s| s.parse().unwrap()).collect();
    assert_eq!(table.total(&seats), 210 + 460 + 460);
    assert_eq!(table.total(&Vec::<SeatCode>::new()), 0);
}
