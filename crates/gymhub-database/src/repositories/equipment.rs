//! Equipment availability checks backed by the equipment and
//! reservations tables.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use sqlx::PgPool;

use gymhub_core::error::{AppError, ErrorKind};
use gymhub_core::result::AppResult;
use gymhub_core::traits::directory::EquipmentCatalog;
use gymhub_core::types::id::EquipmentId;

/// Availability checks against the equipment inventory.
#[derive(Debug, Clone)]
pub struct EquipmentRepository {
    pool: PgPool,
}

impl EquipmentRepository {
    /// Create a new equipment repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EquipmentCatalog for EquipmentRepository {
    async fn is_available(
        &self,
        equipment_id: &EquipmentId,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> AppResult<bool> {
        // Available = exists, in service, and not attached to an active
        // reservation whose session window overlaps the requested one.
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS( \
                SELECT 1 FROM equipment WHERE id = $1 AND NOT out_of_service \
             ) AND NOT EXISTS( \
                SELECT 1 FROM reservations r \
                JOIN gym_sessions s ON s.id = r.session_id \
                WHERE r.status IN ('pending', 'confirmed') \
                AND $1 = ANY(r.equipment_ids) \
                AND s.session_date = $2 AND s.start_time < $4 AND s.end_time > $3 \
             )",
        )
        .bind(*equipment_id)
        .bind(date)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to check equipment", e)
        })
    }
}
