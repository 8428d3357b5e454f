use proptest::prelude::*;
use std::collections::HashSet;

use cinema_booking::models::{SeatCode, Tier};
use cinema_booking::services::pricing::PriceTable;
use cinema_booking::services::seat_map::{
    BookedSeats, SeatLayout, SeatMapView, SeatSelection, SeatStatus, SelectionRejected, Toggled,
};

fn seat(code: &str) -> SeatCode {
    code.parse().unwrap()
}

fn booked(codes: &[&str]) -> BookedSeats {
    codes.iter().map(|c| seat(c)).collect()
}

#[test]
fn default_layout_has_126_unique_seats() {
    let layout = SeatLayout::default();
    let grid = layout.build();
    assert_eq!(grid.len(), 7);
    assert!(grid.iter().all(|row| row.len() == 18));

    let unique: HashSet<SeatCode> = grid.iter().flatten().copied().collect();
    assert_eq!(unique.len(), 126);
}

#[test]
fn rows_f_and_g_are_vip() {
    let layout = SeatLayout::default();
    for row in layout.build() {
        for code in row {
            let expected = if code.row() >= 'F' { Tier::Vip } else { Tier::Standard };
            assert_eq!(code.tier(), expected, "{}", code);
        }
    }
    assert_eq!(seat("E18").tier(), Tier::Standard);
    assert_eq!(seat("F1").tier(), Tier::Vip);
}

#[test]
fn seventh_seat_is_rejected_and_selection_unchanged() {
    let mut selection = SeatSelection::new(SeatLayout::default(), 6);
    let none = BookedSeats::new();
    for code in ["A1", "A2", "A3", "A4", "A5", "A6"] {
        assert_eq!(selection.toggle(seat(code), &none), Ok(Toggled::Selected));
    }
    let before = selection.seats().to_vec();

    assert_eq!(
        selection.toggle(seat("A7"), &none),
        Err(SelectionRejected::LimitReached(6))
    );
    assert_eq!(selection.seats(), before.as_slice());
}

#[test]
fn toggling_selected_seat_deselects_it() {
    let mut selection = SeatSelection::new(SeatLayout::default(), 6);
    let none = BookedSeats::new();
    selection.toggle(seat("C5"), &none).unwrap();
    assert_eq!(selection.toggle(seat("C5"), &none), Ok(Toggled::Deselected));
    assert!(selection.is_empty());
}

#[test]
fn seats_outside_layout_are_rejected() {
    let mut selection = SeatSelection::new(SeatLayout::default(), 6);
    let none = BookedSeats::new();
    assert_eq!(
        selection.toggle(seat("H1"), &none),
        Err(SelectionRejected::OutOfLayout(seat("H1")))
    );
    assert_eq!(
        selection.toggle(seat("A19"), &none),
        Err(SelectionRejected::OutOfLayout(seat("A19")))
    );
}

#[test]
fn drop_booked_returns_lost_seats() {
    let mut selection = SeatSelection::new(SeatLayout::default(), 6);
    let none = BookedSeats::new();
    for code in ["B1", "B2", "G9"] {
        selection.toggle(seat(code), &none).unwrap();
    }
    let lost = selection.drop_booked(&booked(&["B2"]));
    assert_eq!(lost, vec![seat("B2")]);
    assert_eq!(selection.seats(), &[seat("B1"), seat("G9")]);
}

#[test]
fn seat_map_view_splits_rows_at_aisle() {
    let prices = PriceTable { standard: 210, vip: 460 };
    let view = SeatMapView::render(SeatLayout::default(), prices, &booked(&["A1", "A2"]));

    assert_eq!(view.rows.len(), 7);
    assert_eq!(view.booked_count, 2);
    let first = &view.rows[0];
    assert_eq!(first.label, 'A');
    assert_eq!(first.left.len(), 9);
    assert_eq!(first.right.len(), 9);
    assert_eq!(first.left[0].status, SeatStatus::Booked);
    assert_eq!(first.left[2].status, SeatStatus::Available);
    assert_eq!(first.right[0].code, seat("A10"));

    let vip_row = &view.rows[5];
    assert_eq!(vip_row.label, 'F');
    assert!(vip_row.left.iter().all(|s| s.tier == Tier::Vip && s.price == 460));
}

fn any_seat() -> impl Strategy<Value = SeatCode> {
    (0u8..7, 1u8..=18).prop_map(|(row, number)| SeatCode::new((b'A' + row) as char, number).unwrap())
}

proptest! {
    #[test]
    fn booked_seat_never_enters_selection(
        taken in prop::collection::btree_set(any_seat(), 1..20),
        attempts in prop::collection::vec(any_seat(), 1..30),
    ) {
        let mut selection = SeatSelection::new(SeatLayout::default(), 6);
        for candidate in attempts.iter().chain(taken.iter()) {
            let _ = selection.toggle(*candidate, &taken);
        }
        prop_assert!(selection.seats().iter().all(|s| !taken.contains(s)));
        prop_assert!(selection.len() <= 6);
    }
}
