//! Gym session domain entities.

pub mod model;

pub use model::{CreateGymSession, GymSession, SessionUpdate};
