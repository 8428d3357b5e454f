mod common;

use uuid::Uuid;

use cinema_booking::error::BookingError;
use cinema_booking::models::{BookingStatus, SeatCode};
use cinema_booking::services::booking::{BookingRequest, BookingService};
use cinema_booking::services::pricing::PriceTable;
use cinema_booking::services::seat_map::{SeatLayout, SeatSelection};
use cinema_booking::store::Store;

use common::{as_store, memory_store, seed_movie, seed_showtime, seed_theaters, session};

fn codes(seats: &[&str]) -> Vec<String> {
    seats.iter().map(|s| s.to_string()).collect()
}

fn service(store: &std::sync::Arc<cinema_booking::store::MemoryStore>) -> BookingService {
    BookingService::new(as_store(store), SeatLayout::default(), 6)
}

#[tokio::test]
async fn booking_without_session_touches_nothing() {
    let store = memory_store();
    let bookings = service(&store);
    let calls = store.calls();

    let result = bookings
        .submit_booking(
            None,
            BookingRequest {
                showtime_id: Uuid::new_v4(),
                seats: codes(&["A1"]),
                total_price: 210,
            },
        )
        .await;

    assert!(matches!(result, Err(BookingError::NotAuthenticated)));
    assert_eq!(store.calls(), calls);
    assert_eq!(store.write_attempts(), 0);
}

#[tokio::test]
async fn selected_seats_are_booked_at_server_price() {
    let store = memory_store();
    let movie = seed_movie(&store, "tt0133093").await;
    let theater = seed_theaters(&store, 1).await.remove(0);
    let showtime = seed_showtime(&store, &movie, &theater, 210, 460).await;
    let bookings = service(&store);

    // Кто-то уже занял A1 и A2
    bookings
        .submit_booking(
            Some(&session()),
            BookingRequest {
                showtime_id: showtime.id,
                seats: codes(&["A1", "A2"]),
                total_price: 420,
            },
        )
        .await
        .unwrap();

    let booked = bookings.booked_seats(showtime.id).await.unwrap();
    let prices = bookings.prices_for(&showtime).await.unwrap();
    assert_eq!(prices, PriceTable { standard: 210, vip: 460 });

    let mut selection = SeatSelection::new(bookings.layout(), bookings.max_seats());
    for code in ["A3", "F1"] {
        selection.toggle(code.parse().unwrap(), &booked).unwrap();
    }
    let total = selection.total(&prices);
    assert_eq!(total, 670);

    let viewer = session();
    let booking = bookings
        .submit_booking(
            Some(&viewer),
            BookingRequest {
                showtime_id: showtime.id,
                seats: selection.seats().iter().map(|s| s.to_string()).collect(),
                total_price: total,
            },
        )
        .await
        .unwrap();

    let expected: Vec<SeatCode> = vec!["A3".parse().unwrap(), "F1".parse().unwrap()];
    assert_eq!(booking.seats, expected);
    assert_eq!(booking.total_price, 670);
    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert_eq!(booking.user_id, viewer.user_id);
}

#[tokio::test]
async fn sequential_disjoint_bookings_both_succeed() {
    let store = memory_store();
    let movie = seed_movie(&store, "tt1375666").await;
    let theater = seed_theaters(&store, 1).await.remove(0);
    let showtime = seed_showtime(&store, &movie, &theater, 200, 450).await;
    let bookings = service(&store);

    for seats in [["B1", "B2"], ["G1", "G2"]] {
        let prices = bookings.prices_for(&showtime).await.unwrap();
        let parsed: Vec<SeatCode> = seats.iter().map(|s| s.parse().unwrap()).collect();
        bookings
            .submit_booking(
                Some(&session()),
                BookingRequest {
                    showtime_id: showtime.id,
                    seats: codes(&seats),
                    total_price: prices.total(&parsed),
                },
            )
            .await
            .unwrap();
    }

    let booked = bookings.booked_seats(showtime.id).await.unwrap();
    for code in ["B1", "B2", "G1", "G2"] {
        assert!(booked.contains(&code.parse().unwrap()), "{code} missing");
    }
    assert_eq!(booked.len(), 4);
}

#[tokio::test]
async fn overlapping_booking_is_a_seat_conflict() {
    let store = memory_store();
    let movie = seed_movie(&store, "tt0816692").await;
    let theater = seed_theaters(&store, 1).await.remove(0);
    let showtime = seed_showtime(&store, &movie, &theater, 200, 450).await;
    let bookings = service(&store);

    let request = |seats: &[&str], total| BookingRequest {
        showtime_id: showtime.id,
        seats: codes(seats),
        total_price: total,
    };

    bookings
        .submit_booking(Some(&session()), request(&["C3", "C4"], 400))
        .await
        .unwrap();

    let result = bookings
        .submit_booking(Some(&session()), request(&["C4", "C5"], 400))
        .await;
    match result {
        Err(BookingError::SeatConflict(seats)) => assert_eq!(seats, vec!["C4".to_string()]),
        other => panic!("expected seat conflict, got {other:?}"),
    }

    // C5 так и остался свободным
    let booked = bookings.booked_seats(showtime.id).await.unwrap();
    assert!(!booked.contains(&"C5".parse().unwrap()));
}

#[tokio::test]
async fn client_total_must_match_server_total() {
    let store = memory_store();
    let movie = seed_movie(&store, "tt0068646").await;
    let theater = seed_theaters(&store, 1).await.remove(0);
    let showtime = seed_showtime(&store, &movie, &theater, 210, 460).await;
    let bookings = service(&store);
    let writes = store.write_attempts();

    let result = bookings
        .submit_booking(
            Some(&session()),
            BookingRequest {
                showtime_id: showtime.id,
                seats: codes(&["A3", "F1"]),
                total_price: 1,
            },
        )
        .await;

    assert!(matches!(
        result,
        Err(BookingError::PriceMismatch { expected: 670, submitted: 1 })
    ));
    assert_eq!(store.write_attempts(), writes);
}

#[tokio::test]
async fn placeholder_price_uses_movie_key() {
    let store = memory_store();
    let movie = seed_movie(&store, "tt0109830").await;
    let theater = seed_theaters(&store, 1).await.remove(0);
    let showtime = seed_showtime(&store, &movie, &theater, 250, 0).await;
    let bookings = service(&store);

    let derived = PriceTable::derived(&movie.external_id);
    let booking = bookings
        .submit_booking(
            Some(&session()),
            BookingRequest {
                showtime_id: showtime.id,
                seats: codes(&["D4", "G7"]),
                total_price: derived.standard + derived.vip,
            },
        )
        .await
        .unwrap();
    assert_eq!(booking.total_price, derived.standard + derived.vip);
}

#[tokio::test]
async fn invalid_selections_are_rejected_before_storage() {
    let store = memory_store();
    let bookings = service(&store);
    let viewer = session();
    let showtime_id = Uuid::new_v4();
    let calls = store.calls();

    let submit = |seats: Vec<String>| {
        let bookings = &bookings;
        let viewer = &viewer;
        async move {
            bookings
                .submit_booking(
                    Some(viewer),
                    BookingRequest {
                        showtime_id,
                        seats,
                        total_price: 0,
                    },
                )
                .await
        }
    };

    assert!(matches!(submit(vec![]).await, Err(BookingError::EmptySelection)));
    assert!(matches!(
        submit(codes(&["A1", "A2", "A3", "A4", "A5", "A6", "A7"])).await,
        Err(BookingError::TooManySeats(6))
    ));
    assert!(matches!(
        submit(codes(&["A1", "a1"])).await,
        Err(BookingError::DuplicateSeat(seat)) if seat == "A1"
    ));
    assert!(matches!(
        submit(codes(&["Z1"])).await,
        Err(BookingError::InvalidSeat(_))
    ));
    assert!(matches!(
        submit(codes(&["A19"])).await,
        Err(BookingError::InvalidSeat(_))
    ));
    assert!(matches!(
        submit(codes(&["??"])).await,
        Err(BookingError::InvalidSeat(_))
    ));
    assert_eq!(store.calls(), calls);
}

#[tokio::test]
async fn unknown_showtime_is_reported() {
    let store = memory_store();
    let bookings = service(&store);
    let result = bookings
        .submit_booking(
            Some(&session()),
            BookingRequest {
                showtime_id: Uuid::new_v4(),
                seats: codes(&["A1"]),
                total_price: 210,
            },
        )
        .await;
    assert!(matches!(result, Err(BookingError::ShowtimeNotFound)));
}

#[tokio::test]
async fn storage_failure_is_a_retryable_submission_failure() {
    let store = memory_store();
    let movie = seed_movie(&store, "tt0120737").await;
    let theater = seed_theaters(&store, 1).await.remove(0);
    let showtime = seed_showtime(&store, &movie, &theater, 210, 460).await;
    let bookings = service(&store);
    let request = BookingRequest {
        showtime_id: showtime.id,
        seats: codes(&["E5"]),
        total_price: 210,
    };

    store.fail_writes(true);
    let result = bookings
        .submit_booking(Some(&session()), request.clone())
        .await;
    assert!(matches!(result, Err(BookingError::SubmissionFailed(_))));

    // Пользователь повторяет попытку
    store.fail_writes(false);
    let booking = bookings.submit_booking(Some(&session()), request).await.unwrap();
    assert_eq!(booking.total_price, 210);
}

#[tokio::test]
async fn user_bookings_include_details_and_totals() {
    let store = memory_store();
    let movie = seed_movie(&store, "tt0133093").await;
    let theater = seed_theaters(&store, 1).await.remove(0);
    let showtime = seed_showtime(&store, &movie, &theater, 210, 460).await;
    let bookings = service(&store);
    let viewer = session();

    for (seats, total) in [(vec!["A1"], 210), (vec!["F1", "F2"], 920)] {
        bookings
            .submit_booking(
                Some(&viewer),
                BookingRequest {
                    showtime_id: showtime.id,
                    seats: codes(&seats),
                    total_price: total,
                },
            )
            .await
            .unwrap();
    }
    // Чужая бронь в список не попадает
    bookings
        .submit_booking(
            Some(&session()),
            BookingRequest {
                showtime_id: showtime.id,
                seats: codes(&["B1"]),
                total_price: 210,
            },
        )
        .await
        .unwrap();

    let mine = bookings.user_bookings(Some(&viewer)).await.unwrap();
    assert_eq!(mine.count, 2);
    assert_eq!(mine.total_spent, 1130);
    for details in &mine.bookings {
        assert_eq!(details.booking.user_id, viewer.user_id);
        assert_eq!(details.theater.as_ref().map(|t| t.id), Some(theater.id));
        assert_eq!(details.movie.as_ref().map(|m| m.id), Some(movie.id));
        assert_eq!(details.showtime.as_ref().map(|s| s.id), Some(showtime.id));
    }
    assert_eq!(store.bookings_for_user(viewer.user_id).await.unwrap().len(), 2);

    assert!(matches!(
        bookings.user_bookings(None).await,
        Err(BookingError::NotAuthenticated)
    ));
}
