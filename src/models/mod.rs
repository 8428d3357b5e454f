pub mod booking;
pub mod favorite;
pub mod movie;
pub mod seat;
pub mod showtime;
pub mod theater;
pub mod user;

pub use booking::{Booking, BookingDetails, BookingStatus, DashboardStats, NewBooking};
pub use favorite::Favorite;
pub use movie::{Movie, MovieSnapshot, NewMovie};
pub use seat::{SeatCode, Tier};
pub use showtime::{NewShowtime, Showtime, ShowtimeListing};
pub use theater::{NewTheater, Theater};
pub use user::{NewUser, Session, User};
