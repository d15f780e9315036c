//! Notification repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use gymhub_core::error::{AppError, ErrorKind};
use gymhub_core::result::AppResult;
use gymhub_core::types::id::{NotificationId, UserId};
use gymhub_core::types::pagination::{PageRequest, PageResponse};
use gymhub_entity::notification::{CreateNotification, Notification};

use crate::store::NotificationStore;

/// Repository for notification rows.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    /// Create a new notification repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for NotificationRepository {
    async fn create(&self, data: &CreateNotification) -> AppResult<Notification> {
        sqlx::query_as::<_, Notification>(
            "INSERT INTO notifications (user_id, category, title, message, reference_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(data.user_id)
        .bind(&data.category)
        .bind(&data.title)
        .bind(&data.message)
        .bind(data.reference_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to create notification", e)
        })
    }

    async fn find_by_user(
        &self,
        user_id: &UserId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = $1")
                .bind(*user_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to count notifications", e)
                })?;

        let notifications = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE user_id = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(*user_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list notifications", e)
        })?;

        Ok(PageResponse::new(
            notifications,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    async fn mark_read(
        &self,
        id: &NotificationId,
        user_id: &UserId,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE, read_at = $3 \
             WHERE id = $1 AND user_id = $2 AND is_read = FALSE",
        )
        .bind(*id)
        .bind(*user_id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to mark notification read", e)
        })?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_unread(&self, user_id: &UserId) -> AppResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(*user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count unread", e)
        })
    }
}
