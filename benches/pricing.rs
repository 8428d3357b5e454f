//! Цена и схема зала считаются на каждый запрос схемы.
//!
//! Запуск: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cinema_booking::models::{SeatCode, Tier};
use cinema_booking::services::pricing::{derive_price, PriceTable};
use cinema_booking::services::seat_map::{BookedSeats, SeatLayout, SeatMapView, SeatSelection};

fn bench_derive_price(c: &mut Criterion) {
    let mut group = c.benchmark_group("derive_price");
    for key in ["tt0133093", "custom-1773500000000", "Амели"] {
        group.bench_function(key, |b| {
            b.iter(|| derive_price(black_box(key), black_box(Tier::Vip)))
        });
    }
    group.finish();
}

fn bench_seat_map(c: &mut Criterion) {
    let layout = SeatLayout::default();
    let prices = PriceTable::derived("tt0133093");
    let booked: BookedSeats = layout
        .build()
        .into_iter()
        .flatten()
        .step_by(3)
        .collect();

    c.bench_function("seat_map_render", |b| {
        b.iter(|| SeatMapView::render(black_box(layout), prices, black_box(&booked)))
    });

    let picks: Vec<SeatCode> = ["A3", "B4", "F1", "F2", "G9", "G10"]
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();
    c.bench_function("select_and_total", |b| {
        b.iter(|| {
            let mut selection = SeatSelection::new(layout, 6);
            for seat in &picks {
                let _ = selection.toggle(*seat, &booked);
            }
            selection.total(black_box(&prices))
        })
    });
}

criterion_group!(benches, bench_derive_price, bench_seat_map);
criterion_main!(benches);
