//! Trait contracts for external collaborators.
//!
//! The reservation core talks to the user subsystem, the equipment
//! inventory, and the notification delivery channel only through these
//! narrow seams. Store contracts live in `gymhub-database` next to their
//! PostgreSQL and in-memory implementations.

pub mod directory;
pub mod notifier;

pub use directory::{EquipmentCatalog, UserDirectory};
pub use notifier::{NotificationCategory, NotificationGateway};
