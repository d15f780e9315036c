//! In-memory store backend.
//!
//! A mutex-guarded implementation of the store contracts for tests and
//! single-node deployments. One lock covers the whole state, so every
//! multi-aggregate operation (booking, cancellation, session move) is
//! trivially atomic.

pub mod directory;
pub mod store;

pub use directory::{MemoryEquipmentCatalog, MemoryUserDirectory};
pub use store::MemoryStore;
