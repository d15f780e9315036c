//! Gym session repository implementation.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use sqlx::PgPool;

use gymhub_core::error::{AppError, ErrorKind};
use gymhub_core::result::AppResult;
use gymhub_core::types::id::GymSessionId;
use gymhub_entity::session::{CreateGymSession, GymSession, SessionUpdate};

use crate::store::SessionStore;

/// Repository for gym session CRUD and window queries.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Create a new session repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for SessionRepository {
    async fn find_by_id(&self, id: &GymSessionId) -> AppResult<Option<GymSession>> {
        sqlx::query_as::<_, GymSession>("SELECT * FROM gym_sessions WHERE id = $1")
            .bind(*id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find session", e))
    }

    async fn find_by_window(
        &self,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> AppResult<Option<GymSession>> {
        sqlx::query_as::<_, GymSession>(
            "SELECT * FROM gym_sessions \
             WHERE session_date = $1 AND start_time = $2 AND end_time = $3",
        )
        .bind(date)
        .bind(start)
        .bind(end)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find session by window", e)
        })
    }

    async fn find_overlapping(
        &self,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        exclude: Option<&GymSessionId>,
    ) -> AppResult<Vec<GymSession>> {
        sqlx::query_as::<_, GymSession>(
            "SELECT * FROM gym_sessions \
             WHERE session_date = $1 AND start_time < $3 AND end_time > $2 \
             AND ($4::uuid IS NULL OR id <> $4) \
             ORDER BY start_time",
        )
        .bind(date)
        .bind(start)
        .bind(end)
        .bind(exclude.map(|id| id.into_uuid()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find overlapping sessions", e)
        })
    }

    async fn find_in_range(&self, from: NaiveDate, to: NaiveDate) -> AppResult<Vec<GymSession>> {
        sqlx::query_as::<_, GymSession>(
            "SELECT * FROM gym_sessions \
             WHERE session_date BETWEEN $1 AND $2 \
             ORDER BY session_date, start_time",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list sessions in range", e)
        })
    }

    async fn create(&self, data: &CreateGymSession) -> AppResult<GymSession> {
        sqlx::query_as::<_, GymSession>(
            "INSERT INTO gym_sessions (session_date, start_time, end_time, capacity, trainer_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(data.session_date)
        .bind(data.start_time)
        .bind(data.end_time)
        .bind(data.capacity)
        .bind(data.trainer_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create session", e))
    }

    async fn update(&self, id: &GymSessionId, update: &SessionUpdate) -> AppResult<GymSession> {
        sqlx::query_as::<_, GymSession>(
            "UPDATE gym_sessions \
             SET session_date = $2, start_time = $3, end_time = $4, capacity = $5, \
                 trainer_id = $6, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(*id)
        .bind(update.session_date)
        .bind(update.start_time)
        .bind(update.end_time)
        .bind(update.capacity)
        .bind(update.trainer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update session", e))?
        .ok_or_else(|| AppError::not_found(format!("Session {id} not found")))
    }

    async fn delete(&self, id: &GymSessionId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM gym_sessions WHERE id = $1")
            .bind(*id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete session", e)
            })?;
        Ok(result.rows_affected() > 0)
    }
}
