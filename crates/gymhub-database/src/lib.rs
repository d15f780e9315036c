//! # gymhub-database
//!
//! Store contracts and their two backends: PostgreSQL repositories for
//! production and a mutex-guarded in-memory store for tests and
//! single-node deployments. The engines in `gymhub-service` only ever see
//! the traits in [`store`].

pub mod connection;
pub mod memory;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use store::{NotificationStore, ReservationStore, SessionStore, WaitlistStore};
