pub mod booking;
pub mod catalog;
pub mod checkout;
pub mod circuit_breaker;
pub mod favorites;
pub mod pricing;
pub mod provisioner;
pub mod seat_map;

pub use booking::{BookingRequest, BookingService, UserBookings};
pub use catalog::CatalogService;
pub use checkout::{Checkout, CheckoutHold, CheckoutState};
pub use favorites::FavoritesService;
pub use pricing::{derive_price, PriceTable};
pub use provisioner::ShowtimeProvisioner;
pub use seat_map::{BookedSeats, SeatLayout, SeatMapView, SeatSelection};
