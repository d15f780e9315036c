//! # gymhub-core
//!
//! Core crate for GymHub. Contains the unified error system, configuration
//! schemas, typed identifiers, pagination types, and the trait contracts for
//! the external collaborators (user directory, equipment catalog,
//! notification gateway).
//!
//! This crate has **no** internal dependencies on other GymHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
