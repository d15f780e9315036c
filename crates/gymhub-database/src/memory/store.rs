//! In-memory implementation of the store contracts.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use gymhub_core::error::AppError;
use gymhub_core::result::AppResult;
use gymhub_core::types::id::{GymSessionId, NotificationId, ReservationId, UserId, WaitlistEntryId};
use gymhub_core::types::pagination::{PageRequest, PageResponse};
use gymhub_entity::notification::{CreateNotification, Notification};
use gymhub_entity::reservation::{CreateReservation, Reservation, ReservationStatus};
use gymhub_entity::session::{CreateGymSession, GymSession, SessionUpdate};
use gymhub_entity::waitlist::WaitlistEntry;

use crate::store::{NotificationStore, ReservationStore, SessionStore, WaitlistStore};

/// Everything the backend knows, behind one lock.
#[derive(Debug, Default)]
struct State {
    sessions: HashMap<Uuid, GymSession>,
    reservations: HashMap<Uuid, Reservation>,
    waitlist: HashMap<Uuid, WaitlistEntry>,
    notifications: HashMap<Uuid, Notification>,
}

/// In-memory store using a Tokio mutex for thread safety.
///
/// Suitable for single-node deployments and tests. Because the capacity
/// check and the counter increment happen under the same lock, the
/// capacity invariant holds under arbitrary interleavings.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn find_by_id(&self, id: &GymSessionId) -> AppResult<Option<GymSession>> {
        let state = self.state.lock().await;
        Ok(state.sessions.get(id.as_uuid()).cloned())
    }

    async fn find_by_window(
        &self,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> AppResult<Option<GymSession>> {
        let state = self.state.lock().await;
        Ok(state
            .sessions
            .values()
            .find(|s| s.session_date == date && s.start_time == start && s.end_time == end)
            .cloned())
    }

    async fn find_overlapping(
        &self,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        exclude: Option<&GymSessionId>,
    ) -> AppResult<Vec<GymSession>> {
        let state = self.state.lock().await;
        let mut overlapping: Vec<GymSession> = state
            .sessions
            .values()
            .filter(|s| exclude.map(|id| *id.as_uuid() != s.id).unwrap_or(true))
            .filter(|s| s.overlaps(date, start, end))
            .cloned()
            .collect();
        overlapping.sort_by_key(|s| s.start_time);
        Ok(overlapping)
    }

    async fn find_in_range(&self, from: NaiveDate, to: NaiveDate) -> AppResult<Vec<GymSession>> {
        let state = self.state.lock().await;
        let mut sessions: Vec<GymSession> = state
            .sessions
            .values()
            .filter(|s| s.session_date >= from && s.session_date <= to)
            .cloned()
            .collect();
        sessions.sort_by_key(|s| (s.session_date, s.start_time));
        Ok(sessions)
    }

    async fn create(&self, data: &CreateGymSession) -> AppResult<GymSession> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let session = GymSession {
            id: Uuid::new_v4(),
            session_date: data.session_date,
            start_time: data.start_time,
            end_time: data.end_time,
            capacity: data.capacity,
            reserved_spots: 0,
            trainer_id: data.trainer_id,
            created_at: now,
            updated_at: now,
        };
        state.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn update(&self, id: &GymSessionId, update: &SessionUpdate) -> AppResult<GymSession> {
        let mut state = self.state.lock().await;
        let session = state
            .sessions
            .get_mut(id.as_uuid())
            .ok_or_else(|| AppError::not_found(format!("Session {id} not found")))?;
        session.session_date = update.session_date;
        session.start_time = update.start_time;
        session.end_time = update.end_time;
        session.capacity = update.capacity;
        session.trainer_id = update.trainer_id;
        session.updated_at = Utc::now();
        Ok(session.clone())
    }

    async fn delete(&self, id: &GymSessionId) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        Ok(state.sessions.remove(id.as_uuid()).is_some())
    }
}

#[async_trait]
impl ReservationStore for MemoryStore {
    async fn find_by_id(&self, id: &ReservationId) -> AppResult<Option<Reservation>> {
        let state = self.state.lock().await;
        Ok(state.reservations.get(id.as_uuid()).cloned())
    }

    async fn find_by_user(
        &self,
        user_id: &UserId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Reservation>> {
        let state = self.state.lock().await;
        let mut reservations: Vec<Reservation> = state
            .reservations
            .values()
            .filter(|r| r.user_id == *user_id.as_uuid())
            .cloned()
            .collect();
        reservations.sort_by(|a, b| b.reserved_at.cmp(&a.reserved_at));
        let total = reservations.len() as u64;
        let items = reservations
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
        Ok(PageResponse::new(items, page.page, page.page_size, total))
    }

    async fn find_active_by_session(
        &self,
        session_id: &GymSessionId,
    ) -> AppResult<Vec<Reservation>> {
        let state = self.state.lock().await;
        let mut reservations: Vec<Reservation> = state
            .reservations
            .values()
            .filter(|r| r.session_id == *session_id.as_uuid() && r.is_active())
            .cloned()
            .collect();
        reservations.sort_by_key(|r| r.reserved_at);
        Ok(reservations)
    }

    async fn count_active_by_user(&self, user_id: &UserId) -> AppResult<i64> {
        let state = self.state.lock().await;
        Ok(state
            .reservations
            .values()
            .filter(|r| r.user_id == *user_id.as_uuid() && r.is_active())
            .count() as i64)
    }

    async fn book(&self, data: &CreateReservation) -> AppResult<Reservation> {
        let mut state = self.state.lock().await;

        let session = state
            .sessions
            .get_mut(&data.session_id)
            .ok_or_else(|| AppError::not_found("Session not found"))?;
        if !session.has_capacity() {
            return Err(AppError::conflict("Session is full"));
        }
        session.reserved_spots += 1;
        session.updated_at = Utc::now();

        let reservation = Reservation {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            session_id: data.session_id,
            status: ReservationStatus::Confirmed,
            reserved_at: Utc::now(),
            equipment_ids: data.equipment_ids.clone(),
            cancellation_reason: None,
            cancelled_at: None,
            attended: None,
            checked_in_at: None,
            completed_by: None,
            completed_at: None,
            notes: data.notes.clone(),
        };
        state.reservations.insert(reservation.id, reservation.clone());
        Ok(reservation)
    }

    async fn cancel(
        &self,
        id: &ReservationId,
        reason: Option<&str>,
        at: DateTime<Utc>,
    ) -> AppResult<Reservation> {
        let mut state = self.state.lock().await;

        let reservation = state
            .reservations
            .get(id.as_uuid())
            .ok_or_else(|| AppError::not_found(format!("Reservation {id} not found")))?
            .clone();
        if !reservation.is_active() {
            return Err(AppError::conflict(format!(
                "Reservation is already {}",
                reservation.status
            )));
        }

        if let Some(session) = state.sessions.get_mut(&reservation.session_id) {
            session.reserved_spots = (session.reserved_spots - 1).max(0);
            session.updated_at = Utc::now();
        }

        let reservation = state
            .reservations
            .get_mut(id.as_uuid())
            .ok_or_else(|| AppError::internal("Reservation disappeared during cancellation"))?;
        reservation.status = ReservationStatus::Cancelled;
        reservation.cancellation_reason = reason.map(str::to_owned);
        reservation.cancelled_at = Some(at);
        Ok(reservation.clone())
    }

    async fn move_to_session(
        &self,
        id: &ReservationId,
        to: &GymSessionId,
    ) -> AppResult<Reservation> {
        let mut state = self.state.lock().await;

        let old_session_id = state
            .reservations
            .get(id.as_uuid())
            .ok_or_else(|| AppError::not_found(format!("Reservation {id} not found")))?
            .session_id;

        // Take the new spot first; when the target is full nothing has
        // been released yet.
        let target = state
            .sessions
            .get_mut(to.as_uuid())
            .ok_or_else(|| AppError::not_found("Session not found"))?;
        if !target.has_capacity() {
            return Err(AppError::conflict("Session is full"));
        }
        target.reserved_spots += 1;
        target.updated_at = Utc::now();

        if let Some(old) = state.sessions.get_mut(&old_session_id) {
            old.reserved_spots = (old.reserved_spots - 1).max(0);
            old.updated_at = Utc::now();
        }

        let reservation = state
            .reservations
            .get_mut(id.as_uuid())
            .ok_or_else(|| AppError::internal("Reservation disappeared during move"))?;
        reservation.session_id = *to.as_uuid();
        Ok(reservation.clone())
    }

    async fn record_attendance(
        &self,
        id: &ReservationId,
        attended: bool,
        recorder: &UserId,
        at: DateTime<Utc>,
    ) -> AppResult<Reservation> {
        let mut state = self.state.lock().await;
        let reservation = state
            .reservations
            .get_mut(id.as_uuid())
            .ok_or_else(|| AppError::not_found(format!("Reservation {id} not found")))?;
        if reservation.status != ReservationStatus::Confirmed {
            return Err(AppError::invalid_state(format!(
                "Attendance can only be recorded on confirmed reservations (status is {})",
                reservation.status
            )));
        }
        reservation.status = ReservationStatus::Completed;
        reservation.attended = Some(attended);
        reservation.checked_in_at = attended.then_some(at);
        reservation.completed_by = Some(*recorder.as_uuid());
        reservation.completed_at = Some(at);
        Ok(reservation.clone())
    }
}

#[async_trait]
impl WaitlistStore for MemoryStore {
    async fn find_entry(
        &self,
        user_id: &UserId,
        session_id: &GymSessionId,
    ) -> AppResult<Option<WaitlistEntry>> {
        let state = self.state.lock().await;
        Ok(state
            .waitlist
            .values()
            .find(|e| e.user_id == *user_id.as_uuid() && e.session_id == *session_id.as_uuid())
            .cloned())
    }

    async fn find_by_session(&self, session_id: &GymSessionId) -> AppResult<Vec<WaitlistEntry>> {
        let state = self.state.lock().await;
        let mut entries: Vec<WaitlistEntry> = state
            .waitlist
            .values()
            .filter(|e| e.session_id == *session_id.as_uuid())
            .cloned()
            .collect();
        entries.sort_by_key(|e| (e.requested_at, e.id));
        Ok(entries)
    }

    async fn next_pending(&self, session_id: &GymSessionId) -> AppResult<Option<WaitlistEntry>> {
        let entries = self.find_by_session(session_id).await?;
        Ok(entries.into_iter().find(|e| !e.notified))
    }

    async fn create(
        &self,
        user_id: &UserId,
        session_id: &GymSessionId,
    ) -> AppResult<WaitlistEntry> {
        let mut state = self.state.lock().await;
        if let Some(existing) = state
            .waitlist
            .values()
            .find(|e| e.user_id == *user_id.as_uuid() && e.session_id == *session_id.as_uuid())
        {
            return Ok(existing.clone());
        }
        let entry = WaitlistEntry {
            id: Uuid::new_v4(),
            user_id: *user_id.as_uuid(),
            session_id: *session_id.as_uuid(),
            requested_at: Utc::now(),
            notified: false,
            notified_at: None,
        };
        state.waitlist.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn mark_notified(&self, id: &WaitlistEntryId, at: DateTime<Utc>) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        match state.waitlist.get_mut(id.as_uuid()) {
            Some(entry) if !entry.notified => {
                entry.notified = true;
                entry.notified_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn remove(&self, user_id: &UserId, session_id: &GymSessionId) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        let ids: Vec<Uuid> = state
            .waitlist
            .values()
            .filter(|e| e.user_id == *user_id.as_uuid() && e.session_id == *session_id.as_uuid())
            .map(|e| e.id)
            .collect();
        for id in &ids {
            state.waitlist.remove(id);
        }
        Ok(!ids.is_empty())
    }

    async fn remove_by_session(&self, session_id: &GymSessionId) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let ids: Vec<Uuid> = state
            .waitlist
            .values()
            .filter(|e| e.session_id == *session_id.as_uuid())
            .map(|e| e.id)
            .collect();
        for id in &ids {
            state.waitlist.remove(id);
        }
        Ok(ids.len() as u64)
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn create(&self, data: &CreateNotification) -> AppResult<Notification> {
        let mut state = self.state.lock().await;
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            category: data.category.clone(),
            title: data.title.clone(),
            message: data.message.clone(),
            reference_id: data.reference_id,
            is_read: false,
            read_at: None,
            created_at: Utc::now(),
        };
        state
            .notifications
            .insert(notification.id, notification.clone());
        Ok(notification)
    }

    async fn find_by_user(
        &self,
        user_id: &UserId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>> {
        let state = self.state.lock().await;
        let mut notifications: Vec<Notification> = state
            .notifications
            .values()
            .filter(|n| n.user_id == *user_id.as_uuid())
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = notifications.len() as u64;
        let items = notifications
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
        Ok(PageResponse::new(items, page.page, page.page_size, total))
    }

    async fn mark_read(
        &self,
        id: &NotificationId,
        user_id: &UserId,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        match state.notifications.get_mut(id.as_uuid()) {
            Some(n) if n.user_id == *user_id.as_uuid() && !n.is_read => {
                n.is_read = true;
                n.read_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn count_unread(&self, user_id: &UserId) -> AppResult<i64> {
        let state = self.state.lock().await;
        Ok(state
            .notifications
            .values()
            .filter(|n| n.user_id == *user_id.as_uuid() && !n.is_read)
            .count() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gymhub_core::error::ErrorKind;

    fn new_session(capacity: i32) -> CreateGymSession {
        CreateGymSession {
            session_date: "2026-09-07".parse().expect("date"),
            start_time: "09:00:00".parse().expect("start"),
            end_time: "10:00:00".parse().expect("end"),
            capacity,
            trainer_id: None,
        }
    }

    fn booking(session_id: Uuid) -> CreateReservation {
        CreateReservation {
            user_id: Uuid::new_v4(),
            session_id,
            equipment_ids: Vec::new(),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_book_until_full() {
        let store = MemoryStore::new();
        let session = SessionStore::create(&store, &new_session(2)).await.unwrap();

        store.book(&booking(session.id)).await.unwrap();
        store.book(&booking(session.id)).await.unwrap();

        let err = store.book(&booking(session.id)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);

        let session = SessionStore::find_by_id(&store, &session.id.into())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.reserved_spots, 2);
    }

    #[tokio::test]
    async fn test_concurrent_bookings_one_winner() {
        let store = MemoryStore::new();
        let session = SessionStore::create(&store, &new_session(1)).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let data = booking(session.id);
            handles.push(tokio::spawn(async move { store.book(&data).await }));
        }

        let mut won = 0;
        let mut full = 0;
        for handle in handles {
            match handle.await.expect("task") {
                Ok(_) => won += 1,
                Err(e) if e.kind == ErrorKind::Conflict => full += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(won, 1);
        assert_eq!(full, 7);
    }

    #[tokio::test]
    async fn test_cancel_releases_exactly_one_spot() {
        let store = MemoryStore::new();
        let session = SessionStore::create(&store, &new_session(3)).await.unwrap();
        let reservation = store.book(&booking(session.id)).await.unwrap();

        store
            .cancel(&reservation.id.into(), Some("sick"), Utc::now())
            .await
            .unwrap();

        let session = SessionStore::find_by_id(&store, &session.id.into())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.reserved_spots, 0);

        // Double cancel is a conflict and the counter stays put.
        let err = store
            .cancel(&reservation.id.into(), None, Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_move_rolls_nothing_when_target_full() {
        let store = MemoryStore::new();
        let old = SessionStore::create(&store, &new_session(2)).await.unwrap();
        let full = SessionStore::create(&store, &new_session(1)).await.unwrap();
        store.book(&booking(full.id)).await.unwrap();

        let reservation = store.book(&booking(old.id)).await.unwrap();
        let err = store
            .move_to_session(&reservation.id.into(), &full.id.into())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);

        // The old session did not lose its spot.
        let old = SessionStore::find_by_id(&store, &old.id.into())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(old.reserved_spots, 1);
    }

    #[tokio::test]
    async fn test_waitlist_fifo_and_guarded_mark() {
        let store = MemoryStore::new();
        let session_id = GymSessionId::new();
        let first_user = UserId::new();

        let a = WaitlistStore::create(&store, &first_user, &session_id)
            .await
            .unwrap();
        // Idempotent join returns the same entry.
        let again = WaitlistStore::create(&store, &first_user, &session_id)
            .await
            .unwrap();
        assert_eq!(again.id, a.id);

        let b = WaitlistStore::create(&store, &UserId::new(), &session_id)
            .await
            .unwrap();
        let next = store.next_pending(&session_id).await.unwrap().unwrap();
        assert_eq!(next.id, a.id);

        assert!(store.mark_notified(&a.id.into(), Utc::now()).await.unwrap());
        // A second promoter cannot claim the same entry.
        assert!(!store.mark_notified(&a.id.into(), Utc::now()).await.unwrap());

        let next = store.next_pending(&session_id).await.unwrap().unwrap();
        assert_eq!(next.id, b.id);
    }
}
