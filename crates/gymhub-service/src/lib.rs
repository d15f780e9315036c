//! # gymhub-service
//!
//! Business logic engines for GymHub. Each service orchestrates the store
//! contracts from `gymhub-database` and the collaborator traits from
//! `gymhub-core`; none of them touch SQL directly.

pub mod context;
pub mod notification;
pub mod reservation;
pub mod schedule;
pub mod waitlist;

#[cfg(test)]
pub(crate) mod testutil;

pub use notification::NotificationService;
pub use reservation::ReservationService;
pub use schedule::ScheduleService;
pub use waitlist::WaitlistService;
