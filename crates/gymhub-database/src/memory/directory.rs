//! In-memory user directory and equipment catalog.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use tokio::sync::Mutex;
use uuid::Uuid;

use gymhub_core::result::AppResult;
use gymhub_core::traits::directory::{EquipmentCatalog, UserDirectory};
use gymhub_core::types::id::{EquipmentId, UserId};

/// In-memory user directory holding the set of known member IDs.
#[derive(Debug, Clone, Default)]
pub struct MemoryUserDirectory {
    users: Arc<Mutex<HashSet<Uuid>>>,
}

impl MemoryUserDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a member so existence checks succeed for it.
    pub async fn register(&self, user_id: UserId) {
        self.users.lock().await.insert(user_id.into_uuid());
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn user_exists(&self, user_id: &UserId) -> AppResult<bool> {
        Ok(self.users.lock().await.contains(user_id.as_uuid()))
    }
}

/// A window during which a piece of equipment is unavailable.
#[derive(Debug, Clone)]
struct BusyWindow {
    equipment_id: Uuid,
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
}

/// In-memory equipment catalog with explicit busy windows.
#[derive(Debug, Clone, Default)]
pub struct MemoryEquipmentCatalog {
    equipment: Arc<Mutex<HashSet<Uuid>>>,
    busy: Arc<Mutex<Vec<BusyWindow>>>,
}

impl MemoryEquipmentCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a piece of equipment as part of the inventory.
    pub async fn register(&self, equipment_id: EquipmentId) {
        self.equipment.lock().await.insert(equipment_id.into_uuid());
    }

    /// Mark a piece of equipment as taken for a time window.
    pub async fn mark_busy(
        &self,
        equipment_id: EquipmentId,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) {
        self.busy.lock().await.push(BusyWindow {
            equipment_id: equipment_id.into_uuid(),
            date,
            start,
            end,
        });
    }
}

#[async_trait]
impl EquipmentCatalog for MemoryEquipmentCatalog {
    async fn is_available(
        &self,
        equipment_id: &EquipmentId,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> AppResult<bool> {
        if !self.equipment.lock().await.contains(equipment_id.as_uuid()) {
            return Ok(false);
        }
        let busy = self.busy.lock().await;
        let taken = busy.iter().any(|w| {
            w.equipment_id == *equipment_id.as_uuid()
                && w.date == date
                && w.start < end
                && w.end > start
        });
        Ok(!taken)
    }
}
