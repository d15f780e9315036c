//! Reservation domain entities.

pub mod model;
pub mod status;

pub use model::{CreateReservation, Reservation};
pub use status::ReservationStatus;
