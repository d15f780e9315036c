//! Reservation engine.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Utc};
use tracing::{debug, info, warn};

use gymhub_core::config::reservation::ReservationConfig;
use gymhub_core::error::AppError;
use gymhub_core::result::AppResult;
use gymhub_core::traits::directory::{EquipmentCatalog, UserDirectory};
use gymhub_core::traits::notifier::{NotificationCategory, NotificationGateway};
use gymhub_core::types::id::{EquipmentId, GymSessionId, ReservationId, UserId};
use gymhub_core::types::pagination::{PageRequest, PageResponse};
use gymhub_database::store::{ReservationStore, SessionStore};
use gymhub_entity::reservation::{CreateReservation, Reservation};
use gymhub_entity::session::GymSession;

use crate::context::RequestContext;
use crate::notification::messages;
use crate::waitlist::WaitlistService;

/// Reservation engine.
///
/// All capacity-sensitive writes are delegated to the store, where the
/// counter mutation and the reservation write share one atomic unit. The
/// checks performed here before booking (capacity, limit) are advisory
/// fast-fails; the store re-checks capacity inside the atomic unit, so two
/// concurrent bookings of the last spot still produce exactly one winner.
pub struct ReservationService {
    sessions: Arc<dyn SessionStore>,
    reservations: Arc<dyn ReservationStore>,
    users: Arc<dyn UserDirectory>,
    equipment: Arc<dyn EquipmentCatalog>,
    gateway: Arc<dyn NotificationGateway>,
    waitlist: Arc<WaitlistService>,
    config: ReservationConfig,
}

impl ReservationService {
    /// Create a new reservation engine.
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        reservations: Arc<dyn ReservationStore>,
        users: Arc<dyn UserDirectory>,
        equipment: Arc<dyn EquipmentCatalog>,
        gateway: Arc<dyn NotificationGateway>,
        waitlist: Arc<WaitlistService>,
        config: ReservationConfig,
    ) -> Self {
        Self {
            sessions,
            reservations,
            users,
            equipment,
            gateway,
            waitlist,
            config,
        }
    }

    /// Book a spot in a session for a member.
    ///
    /// Equipment IDs that are unknown or already taken for the session's
    /// window are silently dropped; when equipment was requested and none
    /// of it is available the booking is rejected instead.
    pub async fn create(
        &self,
        user_id: &UserId,
        session_id: &GymSessionId,
        equipment_ids: Vec<EquipmentId>,
        notes: Option<String>,
    ) -> AppResult<Reservation> {
        if !self.users.user_exists(user_id).await? {
            return Err(AppError::not_found("User not found"));
        }
        let session = self.require_session(session_id).await?;
        if !session.has_capacity() {
            return Err(AppError::conflict("Session is full"));
        }

        let active = self.reservations.count_active_by_user(user_id).await?;
        if active >= i64::from(self.config.max_active_per_user) {
            return Err(AppError::conflict(format!(
                "Active reservation limit of {} reached",
                self.config.max_active_per_user
            )));
        }

        let equipment_requested = !equipment_ids.is_empty();
        let mut kept = Vec::with_capacity(equipment_ids.len());
        for equipment_id in &equipment_ids {
            let available = self
                .equipment
                .is_available(
                    equipment_id,
                    session.session_date,
                    session.start_time,
                    session.end_time,
                )
                .await?;
            if available {
                kept.push(equipment_id.into_uuid());
            } else {
                debug!(
                    equipment_id = %equipment_id,
                    session_id = %session_id,
                    "Dropping unavailable equipment from reservation"
                );
            }
        }
        if equipment_requested && kept.is_empty() {
            return Err(AppError::conflict(
                "None of the requested equipment is available",
            ));
        }

        let reservation = self
            .reservations
            .book(&CreateReservation {
                user_id: user_id.into_uuid(),
                session_id: session_id.into_uuid(),
                equipment_ids: kept,
                notes,
            })
            .await?;
        info!(
            reservation_id = %reservation.id,
            user_id = %user_id,
            session_id = %session_id,
            "Reservation created"
        );

        let reservation_id = ReservationId::from_uuid(reservation.id);
        if !self
            .gateway
            .reservation_confirmation(user_id, &reservation_id)
            .await
        {
            warn!(reservation_id = %reservation_id, "Confirmation notification not delivered");
        }
        Ok(reservation)
    }

    /// Cancel a reservation the acting member owns.
    ///
    /// The freed spot is offered to the session's waitlist; neither a
    /// failed promotion nor a failed notification rolls the cancellation
    /// back.
    pub async fn cancel(
        &self,
        ctx: &RequestContext,
        reservation_id: &ReservationId,
        reason: Option<String>,
    ) -> AppResult<Reservation> {
        let reservation = self.require_reservation(reservation_id).await?;
        self.check_ownership(ctx, &reservation)?;
        if reservation.is_cancelled() {
            return Err(AppError::conflict("Reservation is already cancelled"));
        }
        let session_id = GymSessionId::from_uuid(reservation.session_id);
        if let Some(session) = self.sessions.find_by_id(&session_id).await? {
            if session.has_started(Utc::now().naive_utc()) {
                return Err(AppError::invalid_state(
                    "Session has already started; the reservation can no longer be cancelled",
                ));
            }
        }

        let cancelled = self
            .reservations
            .cancel(reservation_id, reason.as_deref(), Utc::now())
            .await?;
        info!(reservation_id = %reservation_id, session_id = %session_id, "Reservation cancelled");

        match self.waitlist.notify_next(&session_id).await {
            Ok(true) => debug!(session_id = %session_id, "Freed spot offered to waitlist"),
            Ok(false) => {}
            Err(err) => warn!(session_id = %session_id, error = %err, "Waitlist promotion failed"),
        }

        let (title, message) = messages::reservation_cancelled(reason.as_deref());
        self.gateway
            .notify(
                &ctx.user_id,
                &title,
                &message,
                NotificationCategory::Reservation,
                Some(reservation_id.into_uuid()),
            )
            .await;
        Ok(cancelled)
    }

    /// Move a reservation to the session at a different time window.
    ///
    /// The target session is resolved by its exact (date, start, end)
    /// window. Releasing the old spot and taking the new one happen in one
    /// atomic unit; when the target is full nothing changes.
    pub async fn update_time(
        &self,
        ctx: &RequestContext,
        reservation_id: &ReservationId,
        new_date: NaiveDate,
        new_start: NaiveTime,
        new_end: NaiveTime,
    ) -> AppResult<Reservation> {
        let reservation = self.require_reservation(reservation_id).await?;
        self.check_ownership(ctx, &reservation)?;
        if reservation.is_cancelled() {
            return Err(AppError::conflict("Reservation is already cancelled"));
        }
        let old_session_id = GymSessionId::from_uuid(reservation.session_id);
        if let Some(session) = self.sessions.find_by_id(&old_session_id).await? {
            if session.has_started(Utc::now().naive_utc()) {
                return Err(AppError::invalid_state(
                    "Session has already started; the reservation can no longer be moved",
                ));
            }
        }

        let target = self
            .sessions
            .find_by_window(new_date, new_start, new_end)
            .await?
            .ok_or_else(|| AppError::not_found("No session matches the requested time window"))?;
        let target_id = GymSessionId::from_uuid(target.id);
        if target_id == old_session_id {
            return Ok(reservation);
        }
        if !target.has_capacity() {
            return Err(AppError::conflict("Session is full"));
        }

        let moved = self
            .reservations
            .move_to_session(reservation_id, &target_id)
            .await?;
        info!(
            reservation_id = %reservation_id,
            from = %old_session_id,
            to = %target_id,
            "Reservation moved"
        );

        // A spot opened on the old session.
        match self.waitlist.notify_next(&old_session_id).await {
            Ok(true) => debug!(session_id = %old_session_id, "Freed spot offered to waitlist"),
            Ok(false) => {}
            Err(err) => {
                warn!(session_id = %old_session_id, error = %err, "Waitlist promotion failed")
            }
        }

        let (title, message) = messages::reservation_moved(&target_id);
        self.gateway
            .notify(
                &ctx.user_id,
                &title,
                &message,
                NotificationCategory::Reservation,
                Some(reservation_id.into_uuid()),
            )
            .await;
        Ok(moved)
    }

    /// Record attendance for a confirmed reservation, completing it.
    pub async fn record_attendance(
        &self,
        reservation_id: &ReservationId,
        attended: bool,
        recorder: &UserId,
    ) -> AppResult<Reservation> {
        let completed = self
            .reservations
            .record_attendance(reservation_id, attended, recorder, Utc::now())
            .await?;
        info!(reservation_id = %reservation_id, attended, "Attendance recorded");

        let (title, message) = messages::attendance_recorded(attended);
        self.gateway
            .notify(
                &UserId::from_uuid(completed.user_id),
                &title,
                &message,
                NotificationCategory::Attendance,
                Some(reservation_id.into_uuid()),
            )
            .await;
        Ok(completed)
    }

    /// Fetch a reservation by ID.
    pub async fn get(&self, reservation_id: &ReservationId) -> AppResult<Reservation> {
        self.require_reservation(reservation_id).await
    }

    /// Paginated reservation history for a member, newest first.
    pub async fn list_for_user(
        &self,
        user_id: &UserId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Reservation>> {
        self.reservations.find_by_user(user_id, page).await
    }

    /// Active reservations holding spots on a session.
    pub async fn active_for_session(
        &self,
        session_id: &GymSessionId,
    ) -> AppResult<Vec<Reservation>> {
        self.reservations.find_active_by_session(session_id).await
    }

    async fn require_session(&self, session_id: &GymSessionId) -> AppResult<GymSession> {
        self.sessions
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| AppError::not_found("Session not found"))
    }

    async fn require_reservation(
        &self,
        reservation_id: &ReservationId,
    ) -> AppResult<Reservation> {
        self.reservations
            .find_by_id(reservation_id)
            .await?
            .ok_or_else(|| AppError::not_found("Reservation not found"))
    }

    fn check_ownership(&self, ctx: &RequestContext, reservation: &Reservation) -> AppResult<()> {
        if reservation.user_id != *ctx.user_id.as_uuid() {
            return Err(AppError::unauthorized(
                "Reservation belongs to another user",
            ));
        }
        Ok(())
    }
}
