//! Lookup contracts for the user and equipment subsystems.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};

use crate::result::AppResult;
use crate::types::id::{EquipmentId, UserId};

/// Existence checks against the user subsystem.
///
/// The reservation core never reads user profiles; it only needs to know
/// whether a referenced member exists before booking or waitlisting.
#[async_trait]
pub trait UserDirectory: Send + Sync + 'static {
    /// Check whether a user with the given ID exists.
    async fn user_exists(&self, user_id: &UserId) -> AppResult<bool>;
}

/// Availability checks against the equipment inventory.
#[async_trait]
pub trait EquipmentCatalog: Send + Sync + 'static {
    /// Check whether a piece of equipment exists and is free for the
    /// given time window.
    async fn is_available(
        &self,
        equipment_id: &EquipmentId,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> AppResult<bool>;
}
