pub mod lot;
pub mod reservation;
pub mod user;

pub use lot::{ParkingLot, ParkingSpot, SpotStatus};
pub use reservation::Reservation;
pub use user::{Admin, User};
