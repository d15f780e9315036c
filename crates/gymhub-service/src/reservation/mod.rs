//! Reservation engine: booking, cancellation, rescheduling, attendance.

mod service;

pub use service::ReservationService;
