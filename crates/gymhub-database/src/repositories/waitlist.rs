//! Waitlist repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use gymhub_core::error::{AppError, ErrorKind};
use gymhub_core::result::AppResult;
use gymhub_core::types::id::{GymSessionId, UserId, WaitlistEntryId};
use gymhub_entity::waitlist::WaitlistEntry;

use crate::store::WaitlistStore;

/// Repository for the per-session FIFO waitlist.
#[derive(Debug, Clone)]
pub struct WaitlistRepository {
    pool: PgPool,
}

impl WaitlistRepository {
    /// Create a new waitlist repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WaitlistStore for WaitlistRepository {
    async fn find_entry(
        &self,
        user_id: &UserId,
        session_id: &GymSessionId,
    ) -> AppResult<Option<WaitlistEntry>> {
        sqlx::query_as::<_, WaitlistEntry>(
            "SELECT * FROM waitlist_entries WHERE user_id = $1 AND session_id = $2",
        )
        .bind(*user_id)
        .bind(*session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find waitlist entry", e)
        })
    }

    async fn find_by_session(&self, session_id: &GymSessionId) -> AppResult<Vec<WaitlistEntry>> {
        sqlx::query_as::<_, WaitlistEntry>(
            "SELECT * FROM waitlist_entries WHERE session_id = $1 \
             ORDER BY requested_at ASC, id ASC",
        )
        .bind(*session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list waitlist", e))
    }

    async fn next_pending(&self, session_id: &GymSessionId) -> AppResult<Option<WaitlistEntry>> {
        sqlx::query_as::<_, WaitlistEntry>(
            "SELECT * FROM waitlist_entries \
             WHERE session_id = $1 AND notified = FALSE \
             ORDER BY requested_at ASC, id ASC LIMIT 1",
        )
        .bind(*session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find next waitlist entry", e)
        })
    }

    async fn create(
        &self,
        user_id: &UserId,
        session_id: &GymSessionId,
    ) -> AppResult<WaitlistEntry> {
        // The unique (user_id, session_id) constraint makes a racing join
        // fall through to the existing row instead of failing.
        let inserted = sqlx::query_as::<_, WaitlistEntry>(
            "INSERT INTO waitlist_entries (user_id, session_id) VALUES ($1, $2) \
             ON CONFLICT (user_id, session_id) DO NOTHING RETURNING *",
        )
        .bind(*user_id)
        .bind(*session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to create waitlist entry", e)
        })?;

        match inserted {
            Some(entry) => Ok(entry),
            None => self
                .find_entry(user_id, session_id)
                .await?
                .ok_or_else(|| AppError::internal("Waitlist entry vanished during join")),
        }
    }

    async fn mark_notified(&self, id: &WaitlistEntryId, at: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE waitlist_entries SET notified = TRUE, notified_at = $2 \
             WHERE id = $1 AND notified = FALSE",
        )
        .bind(*id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to mark entry notified", e)
        })?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove(&self, user_id: &UserId, session_id: &GymSessionId) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM waitlist_entries WHERE user_id = $1 AND session_id = $2",
        )
        .bind(*user_id)
        .bind(*session_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to remove waitlist entry", e)
        })?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove_by_session(&self, session_id: &GymSessionId) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM waitlist_entries WHERE session_id = $1")
            .bind(*session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to clear waitlist", e)
            })?;
        Ok(result.rows_affected())
    }
}
