//! # gymhub-entity
//!
//! Domain entity models for GymHub. Every struct in this crate represents
//! a database table row or a domain value object. All entities derive
//! `Debug`, `Clone`, `Serialize`, `Deserialize`, and database entities
//! additionally derive `sqlx::FromRow`.

pub mod notification;
pub mod reservation;
pub mod session;
pub mod waitlist;
