//! Session scheduling engine.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, NaiveTime, Utc, Weekday};
use tracing::{debug, info, warn};
use uuid::Uuid;

use gymhub_core::error::{AppError, ErrorKind};
use gymhub_core::result::AppResult;
use gymhub_core::traits::notifier::{NotificationCategory, NotificationGateway};
use gymhub_core::types::id::{GymSessionId, ReservationId, UserId};
use gymhub_database::store::{ReservationStore, SessionStore, WaitlistStore};
use gymhub_entity::session::{CreateGymSession, GymSession, SessionUpdate};

use crate::notification::messages;

/// Session scheduling engine.
///
/// Sessions live on a single shared floor, so two sessions must never
/// overlap in time on the same date. The overlap comparison is strict: a
/// session may start exactly when another ends.
pub struct ScheduleService {
    sessions: Arc<dyn SessionStore>,
    reservations: Arc<dyn ReservationStore>,
    waitlist: Arc<dyn WaitlistStore>,
    gateway: Arc<dyn NotificationGateway>,
}

impl ScheduleService {
    /// Create a new schedule engine.
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        reservations: Arc<dyn ReservationStore>,
        waitlist: Arc<dyn WaitlistStore>,
        gateway: Arc<dyn NotificationGateway>,
    ) -> Self {
        Self {
            sessions,
            reservations,
            waitlist,
            gateway,
        }
    }

    /// Schedule a new session.
    pub async fn create_session(
        &self,
        session_date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        capacity: i32,
        trainer_id: Option<Uuid>,
    ) -> AppResult<GymSession> {
        validate_window(start_time, end_time, capacity)?;
        let overlapping = self
            .sessions
            .find_overlapping(session_date, start_time, end_time, None)
            .await?;
        if !overlapping.is_empty() {
            return Err(AppError::conflict(
                "Session time conflicts with an existing session",
            ));
        }

        let session = self
            .sessions
            .create(&CreateGymSession {
                session_date,
                start_time,
                end_time,
                capacity,
                trainer_id,
            })
            .await?;
        info!(
            session_id = %session.id,
            date = %session_date,
            start = %start_time,
            "Session scheduled"
        );
        Ok(session)
    }

    /// Reschedule an existing session.
    ///
    /// Capacity may grow freely but can never drop below the number of
    /// spots already reserved.
    pub async fn update_session(
        &self,
        session_id: &GymSessionId,
        update: SessionUpdate,
    ) -> AppResult<GymSession> {
        let session = self.require_session(session_id).await?;
        validate_window(update.start_time, update.end_time, update.capacity)?;
        if update.capacity < session.reserved_spots {
            return Err(AppError::conflict(format!(
                "Capacity cannot drop below the {} spots already reserved",
                session.reserved_spots
            )));
        }
        let overlapping = self
            .sessions
            .find_overlapping(
                update.session_date,
                update.start_time,
                update.end_time,
                Some(session_id),
            )
            .await?;
        if !overlapping.is_empty() {
            return Err(AppError::conflict(
                "Session time conflicts with an existing session",
            ));
        }

        let updated = self.sessions.update(session_id, &update).await?;
        info!(session_id = %session_id, "Session rescheduled");
        Ok(updated)
    }

    /// Cancel a session entirely.
    ///
    /// Every active reservation is cancelled (its holder notified with the
    /// reason), the waitlist is cleared, and the session is removed.
    /// Returns the number of reservations cancelled.
    pub async fn cancel_session(
        &self,
        session_id: &GymSessionId,
        reason: Option<String>,
    ) -> AppResult<u64> {
        self.require_session(session_id).await?;

        let active = self.reservations.find_active_by_session(session_id).await?;
        let mut cancelled = 0u64;
        let now = Utc::now();
        for reservation in &active {
            let reservation_id = ReservationId::from_uuid(reservation.id);
            self.reservations
                .cancel(&reservation_id, reason.as_deref(), now)
                .await?;
            cancelled += 1;

            let (title, message) = messages::session_cancelled(reason.as_deref());
            self.gateway
                .notify(
                    &UserId::from_uuid(reservation.user_id),
                    &title,
                    &message,
                    NotificationCategory::Session,
                    Some(session_id.into_uuid()),
                )
                .await;
        }

        let dropped = self.waitlist.remove_by_session(session_id).await?;
        self.sessions.delete(session_id).await?;
        info!(
            session_id = %session_id,
            cancelled_reservations = cancelled,
            dropped_waitlist_entries = dropped,
            "Session cancelled"
        );
        Ok(cancelled)
    }

    /// Create a session on every matching weekday in `[from, to]`.
    ///
    /// Dates whose window clashes with an existing session are skipped
    /// rather than failing the whole run. Returns the number of sessions
    /// created.
    #[allow(clippy::too_many_arguments)]
    pub async fn configure_recurring(
        &self,
        weekday: Weekday,
        start_time: NaiveTime,
        end_time: NaiveTime,
        capacity: i32,
        trainer_id: Option<Uuid>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<u32> {
        if from > to {
            return Err(AppError::validation("Date range start must not be after its end"));
        }
        validate_window(start_time, end_time, capacity)?;

        let mut created = 0u32;
        let mut date = from;
        while date <= to {
            if date.weekday() == weekday {
                match self
                    .create_session(date, start_time, end_time, capacity, trainer_id)
                    .await
                {
                    Ok(_) => created += 1,
                    Err(err) if err.kind == ErrorKind::Conflict => {
                        debug!(date = %date, "Skipping conflicting date in recurring schedule");
                    }
                    Err(err) => {
                        warn!(date = %date, error = %err, "Recurring schedule aborted");
                        return Err(err);
                    }
                }
            }
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }
        Ok(created)
    }

    /// Per-date occupancy percentage over a date range.
    ///
    /// For each date with sessions: `sum(reserved) * 100 / sum(capacity)`,
    /// zero when the capacity sum is zero.
    pub async fn occupancy_statistics(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<BTreeMap<NaiveDate, u32>> {
        let sessions = self.sessions.find_in_range(from, to).await?;
        let mut totals: BTreeMap<NaiveDate, (i64, i64)> = BTreeMap::new();
        for session in &sessions {
            let entry = totals.entry(session.session_date).or_insert((0, 0));
            entry.0 += i64::from(session.reserved_spots.max(0));
            entry.1 += i64::from(session.capacity.max(0));
        }
        let stats = totals
            .into_iter()
            .map(|(date, (reserved, capacity))| {
                let percent = if capacity > 0 {
                    (reserved * 100 / capacity) as u32
                } else {
                    0
                };
                (date, percent)
            })
            .collect();
        Ok(stats)
    }

    /// List sessions dated within `[from, to]`.
    pub async fn sessions_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<GymSession>> {
        self.sessions.find_in_range(from, to).await
    }

    /// Fetch a session by ID.
    pub async fn get(&self, session_id: &GymSessionId) -> AppResult<GymSession> {
        self.require_session(session_id).await
    }

    async fn require_session(&self, session_id: &GymSessionId) -> AppResult<GymSession> {
        self.sessions
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| AppError::not_found("Session not found"))
    }
}

fn validate_window(start: NaiveTime, end: NaiveTime, capacity: i32) -> AppResult<()> {
    if start >= end {
        return Err(AppError::validation(
            "Session start time must be before its end time",
        ));
    }
    if capacity <= 0 {
        return Err(AppError::validation("Session capacity must be positive"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::testutil::Harness;

    use super::*;

    fn t(s: &str) -> NaiveTime {
        s.parse().expect("time")
    }

    fn d(s: &str) -> NaiveDate {
        s.parse().expect("date")
    }

    #[tokio::test]
    async fn test_create_session_validates_window_and_capacity() {
        let h = Harness::new();

        let err = h
            .schedule
            .create_session(d("2026-09-07"), t("10:00:00"), t("09:00:00"), 10, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let err = h
            .schedule
            .create_session(d("2026-09-07"), t("09:00:00"), t("10:00:00"), 0, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_overlap_rejected_back_to_back_allowed() {
        let h = Harness::new();
        h.schedule
            .create_session(d("2026-09-07"), t("09:00:00"), t("10:00:00"), 10, None)
            .await
            .unwrap();

        // Partial overlap on the same date.
        let err = h
            .schedule
            .create_session(d("2026-09-07"), t("09:30:00"), t("10:30:00"), 10, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);

        // Back-to-back is legal, as is the same window on another date.
        h.schedule
            .create_session(d("2026-09-07"), t("10:00:00"), t("11:00:00"), 10, None)
            .await
            .unwrap();
        h.schedule
            .create_session(d("2026-09-08"), t("09:00:00"), t("10:00:00"), 10, None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_session_excludes_self_from_overlap() {
        let h = Harness::new();
        let session = h
            .schedule
            .create_session(d("2026-09-07"), t("09:00:00"), t("10:00:00"), 10, None)
            .await
            .unwrap();

        // Widening its own window is not a conflict with itself.
        let updated = h
            .schedule
            .update_session(
                &GymSessionId::from_uuid(session.id),
                SessionUpdate {
                    session_date: d("2026-09-07"),
                    start_time: t("09:00:00"),
                    end_time: t("10:30:00"),
                    capacity: 12,
                    trainer_id: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.end_time, t("10:30:00"));
        assert_eq!(updated.capacity, 12);
    }

    #[tokio::test]
    async fn test_update_session_rejects_capacity_below_reserved() {
        let h = Harness::new();
        let session = h
            .schedule
            .create_session(d("2026-09-07"), t("09:00:00"), t("10:00:00"), 5, None)
            .await
            .unwrap();
        let session_id = GymSessionId::from_uuid(session.id);
        for _ in 0..2 {
            let member = h.member().await;
            h.reservations
                .create(&member, &session_id, vec![], None)
                .await
                .unwrap();
        }

        let err = h
            .schedule
            .update_session(
                &session_id,
                SessionUpdate {
                    session_date: d("2026-09-07"),
                    start_time: t("09:00:00"),
                    end_time: t("10:00:00"),
                    capacity: 1,
                    trainer_id: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_cancel_session_cascades() {
        let h = Harness::new();
        let session = h
            .schedule
            .create_session(d("2026-09-07"), t("09:00:00"), t("10:00:00"), 5, None)
            .await
            .unwrap();
        let session_id = GymSessionId::from_uuid(session.id);

        let mut members = Vec::new();
        for _ in 0..3 {
            let member = h.member().await;
            h.reservations
                .create(&member, &session_id, vec![], None)
                .await
                .unwrap();
            members.push(member);
        }
        let waiter = h.member().await;
        h.waitlist.join(&waiter, &session_id).await.unwrap();

        let cancelled = h
            .schedule
            .cancel_session(&session_id, Some("floor maintenance".to_string()))
            .await
            .unwrap();
        assert_eq!(cancelled, 3);

        // Session is gone, waitlist cleared, holders notified.
        let err = h.schedule.get(&session_id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(h.waitlist.position(&waiter, &session_id).await.unwrap(), 0);
        let sent = h.gateway.sent().await;
        for member in &members {
            assert!(sent
                .iter()
                .any(|m| m.user_id == member.into_uuid() && m.title == "Session cancelled"));
        }

        // The cascade really flipped the reservations to cancelled.
        let page = h
            .reservations
            .list_for_user(&members[0], &Default::default())
            .await
            .unwrap();
        assert!(page.items[0].is_cancelled());
    }

    #[tokio::test]
    async fn test_configure_recurring_skips_conflicts() {
        let h = Harness::new();
        // Occupy one Monday in the range up front.
        h.schedule
            .create_session(d("2026-09-14"), t("09:30:00"), t("10:30:00"), 10, None)
            .await
            .unwrap();

        // Mondays in [2026-09-01, 2026-09-30]: 7th, 14th, 21st, 28th.
        let created = h
            .schedule
            .configure_recurring(
                Weekday::Mon,
                t("09:00:00"),
                t("10:00:00"),
                10,
                None,
                d("2026-09-01"),
                d("2026-09-30"),
            )
            .await
            .unwrap();
        assert_eq!(created, 3);

        let sessions = h
            .schedule
            .sessions_in_range(d("2026-09-01"), d("2026-09-30"))
            .await
            .unwrap();
        assert_eq!(sessions.len(), 4);
    }

    #[tokio::test]
    async fn test_occupancy_statistics_per_date() {
        let h = Harness::new();
        let morning = h
            .schedule
            .create_session(d("2026-09-07"), t("09:00:00"), t("10:00:00"), 4, None)
            .await
            .unwrap();
        h.schedule
            .create_session(d("2026-09-07"), t("11:00:00"), t("12:00:00"), 6, None)
            .await
            .unwrap();
        h.schedule
            .create_session(d("2026-09-08"), t("09:00:00"), t("10:00:00"), 10, None)
            .await
            .unwrap();

        let morning_id = GymSessionId::from_uuid(morning.id);
        for _ in 0..2 {
            let member = h.member().await;
            h.reservations
                .create(&member, &morning_id, vec![], None)
                .await
                .unwrap();
        }

        let stats = h
            .schedule
            .occupancy_statistics(d("2026-09-07"), d("2026-09-08"))
            .await
            .unwrap();
        // 2 reserved of 10 total capacity on the 7th.
        assert_eq!(stats.get(&d("2026-09-07")), Some(&20));
        assert_eq!(stats.get(&d("2026-09-08")), Some(&0));
    }
}
