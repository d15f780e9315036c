//! Reservation repository implementation.
//!
//! Booking, cancellation, and session moves pair the reservation write
//! with the session counter mutation inside a single transaction. The
//! counter increment is a conditional `UPDATE ... WHERE reserved_spots <
//! capacity`, so under the default READ COMMITTED isolation two
//! concurrent bookings against the last free spot serialize on the
//! session row and exactly one sees a row affected.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use gymhub_core::error::{AppError, ErrorKind};
use gymhub_core::result::AppResult;
use gymhub_core::types::id::{GymSessionId, ReservationId, UserId};
use gymhub_core::types::pagination::{PageRequest, PageResponse};
use gymhub_entity::reservation::{CreateReservation, Reservation};

use crate::store::ReservationStore;

/// Repository for reservations and their paired capacity mutations.
#[derive(Debug, Clone)]
pub struct ReservationRepository {
    pool: PgPool,
}

impl ReservationRepository {
    /// Create a new reservation repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn session_exists(&self, session_id: uuid::Uuid) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM gym_sessions WHERE id = $1)")
            .bind(session_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to check session", e))
    }
}

#[async_trait]
impl ReservationStore for ReservationRepository {
    async fn find_by_id(&self, id: &ReservationId) -> AppResult<Option<Reservation>> {
        sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1")
            .bind(*id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find reservation", e)
            })
    }

    async fn find_by_user(
        &self,
        user_id: &UserId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Reservation>> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM reservations WHERE user_id = $1")
                .bind(*user_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to count reservations", e)
                })?;

        let reservations = sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations WHERE user_id = $1 \
             ORDER BY reserved_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(*user_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list reservations", e)
        })?;

        Ok(PageResponse::new(
            reservations,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    async fn find_active_by_session(
        &self,
        session_id: &GymSessionId,
    ) -> AppResult<Vec<Reservation>> {
        sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations \
             WHERE session_id = $1 AND status IN ('pending', 'confirmed') \
             ORDER BY reserved_at",
        )
        .bind(*session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list active reservations", e)
        })
    }

    async fn count_active_by_user(&self, user_id: &UserId) -> AppResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM reservations \
             WHERE user_id = $1 AND status IN ('pending', 'confirmed')",
        )
        .bind(*user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count active reservations", e)
        })
    }

    async fn book(&self, data: &CreateReservation) -> AppResult<Reservation> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to start transaction", e)
        })?;

        let taken = sqlx::query(
            "UPDATE gym_sessions \
             SET reserved_spots = reserved_spots + 1, updated_at = NOW() \
             WHERE id = $1 AND reserved_spots < capacity",
        )
        .bind(data.session_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to reserve spot", e))?;

        if taken.rows_affected() == 0 {
            let _ = tx.rollback().await;
            return if self.session_exists(data.session_id).await? {
                Err(AppError::conflict("Session is full"))
            } else {
                Err(AppError::not_found("Session not found"))
            };
        }

        let reservation = sqlx::query_as::<_, Reservation>(
            "INSERT INTO reservations (user_id, session_id, status, equipment_ids, notes) \
             VALUES ($1, $2, 'confirmed', $3, $4) RETURNING *",
        )
        .bind(data.user_id)
        .bind(data.session_id)
        .bind(&data.equipment_ids)
        .bind(&data.notes)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to insert reservation", e)
        })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit booking", e)
        })?;

        Ok(reservation)
    }

    async fn cancel(
        &self,
        id: &ReservationId,
        reason: Option<&str>,
        at: DateTime<Utc>,
    ) -> AppResult<Reservation> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to start transaction", e)
        })?;

        let reservation = sqlx::query_as::<_, Reservation>(
            "UPDATE reservations \
             SET status = 'cancelled', cancellation_reason = $2, cancelled_at = $3 \
             WHERE id = $1 AND status IN ('pending', 'confirmed') RETURNING *",
        )
        .bind(*id)
        .bind(reason)
        .bind(at)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to cancel reservation", e)
        })?;

        let Some(reservation) = reservation else {
            let _ = tx.rollback().await;
            return match self.find_by_id(id).await? {
                None => Err(AppError::not_found(format!("Reservation {id} not found"))),
                Some(existing) => Err(AppError::conflict(format!(
                    "Reservation is already {}",
                    existing.status
                ))),
            };
        };

        // Floor at zero so a counter drifted low can never go negative.
        sqlx::query(
            "UPDATE gym_sessions \
             SET reserved_spots = GREATEST(reserved_spots - 1, 0), updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(reservation.session_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to release spot", e))?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit cancellation", e)
        })?;

        Ok(reservation)
    }

    async fn move_to_session(
        &self,
        id: &ReservationId,
        to: &GymSessionId,
    ) -> AppResult<Reservation> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to start transaction", e)
        })?;

        let current = sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations WHERE id = $1 FOR UPDATE",
        )
        .bind(*id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock reservation", e))?
        .ok_or_else(|| AppError::not_found(format!("Reservation {id} not found")))?;

        let taken = sqlx::query(
            "UPDATE gym_sessions \
             SET reserved_spots = reserved_spots + 1, updated_at = NOW() \
             WHERE id = $1 AND reserved_spots < capacity",
        )
        .bind(*to)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to reserve spot", e))?;

        if taken.rows_affected() == 0 {
            let _ = tx.rollback().await;
            return if self.session_exists(to.into_uuid()).await? {
                Err(AppError::conflict("Session is full"))
            } else {
                Err(AppError::not_found("Session not found"))
            };
        }

        sqlx::query(
            "UPDATE gym_sessions \
             SET reserved_spots = GREATEST(reserved_spots - 1, 0), updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(current.session_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to release spot", e))?;

        let reservation = sqlx::query_as::<_, Reservation>(
            "UPDATE reservations SET session_id = $2 WHERE id = $1 RETURNING *",
        )
        .bind(*id)
        .bind(*to)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update reservation", e)
        })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit session move", e)
        })?;

        Ok(reservation)
    }

    async fn record_attendance(
        &self,
        id: &ReservationId,
        attended: bool,
        recorder: &UserId,
        at: DateTime<Utc>,
    ) -> AppResult<Reservation> {
        let reservation = sqlx::query_as::<_, Reservation>(
            "UPDATE reservations \
             SET status = 'completed', attended = $2, \
                 checked_in_at = CASE WHEN $2 THEN $4 ELSE NULL END, \
                 completed_by = $3, completed_at = $4 \
             WHERE id = $1 AND status = 'confirmed' RETURNING *",
        )
        .bind(*id)
        .bind(attended)
        .bind(*recorder)
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to record attendance", e)
        })?;

        match reservation {
            Some(reservation) => Ok(reservation),
            None => match self.find_by_id(id).await? {
                None => Err(AppError::not_found(format!("Reservation {id} not found"))),
                Some(existing) => Err(AppError::invalid_state(format!(
                    "Attendance can only be recorded on confirmed reservations (status is {})",
                    existing.status
                ))),
            },
        }
    }
}
