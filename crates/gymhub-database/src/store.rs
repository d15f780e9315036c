//! Store contracts for the reservation core.
//!
//! Capacity-mutating operations are deliberately coarse: `book`, `cancel`,
//! and `move_to_session` pair the session counter mutation with the
//! reservation write inside one atomic unit, so a lost update on the
//! counter cannot occur no matter how calls interleave. Implementations
//! must guarantee atomicity per method: the PostgreSQL backend uses a
//! transaction with conditional updates, the in-memory backend a single
//! mutex over the whole state.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use gymhub_core::result::AppResult;
use gymhub_core::types::id::{GymSessionId, ReservationId, UserId, WaitlistEntryId};
use gymhub_core::types::id::NotificationId;
use gymhub_core::types::pagination::{PageRequest, PageResponse};
use gymhub_entity::notification::{CreateNotification, Notification};
use gymhub_entity::reservation::{CreateReservation, Reservation};
use gymhub_entity::session::{CreateGymSession, GymSession, SessionUpdate};
use gymhub_entity::waitlist::WaitlistEntry;

/// Durable record of gym sessions.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Find a session by ID.
    async fn find_by_id(&self, id: &GymSessionId) -> AppResult<Option<GymSession>>;

    /// Find the session exactly matching a (date, start, end) window.
    async fn find_by_window(
        &self,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> AppResult<Option<GymSession>>;

    /// Find sessions on `date` whose window overlaps `[start, end)`,
    /// optionally excluding one session (used when rescheduling it).
    ///
    /// The overlap comparison is strict: back-to-back sessions do not
    /// overlap.
    async fn find_overlapping(
        &self,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        exclude: Option<&GymSessionId>,
    ) -> AppResult<Vec<GymSession>>;

    /// List sessions dated within `[from, to]`, ordered by date and start
    /// time.
    async fn find_in_range(&self, from: NaiveDate, to: NaiveDate) -> AppResult<Vec<GymSession>>;

    /// Persist a new session with zero reserved spots.
    async fn create(&self, data: &CreateGymSession) -> AppResult<GymSession>;

    /// Apply a reschedule to an existing session.
    async fn update(&self, id: &GymSessionId, update: &SessionUpdate) -> AppResult<GymSession>;

    /// Hard-delete a session. Returns `true` if a row was removed.
    async fn delete(&self, id: &GymSessionId) -> AppResult<bool>;
}

/// Durable record of reservations and their paired capacity mutations.
#[async_trait]
pub trait ReservationStore: Send + Sync + 'static {
    /// Find a reservation by ID.
    async fn find_by_id(&self, id: &ReservationId) -> AppResult<Option<Reservation>>;

    /// Paginated reservation history for a user, newest first.
    async fn find_by_user(
        &self,
        user_id: &UserId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Reservation>>;

    /// Active (pending or confirmed) reservations for a session.
    async fn find_active_by_session(
        &self,
        session_id: &GymSessionId,
    ) -> AppResult<Vec<Reservation>>;

    /// Count a user's active (non-cancelled, non-completed) reservations.
    async fn count_active_by_user(&self, user_id: &UserId) -> AppResult<i64>;

    /// Atomically take one spot on the session and insert a confirmed
    /// reservation.
    ///
    /// Fails with a Conflict when the session is full; the capacity check
    /// and the increment happen in the same atomic unit, so concurrent
    /// calls against the last free spot produce exactly one winner.
    async fn book(&self, data: &CreateReservation) -> AppResult<Reservation>;

    /// Atomically cancel a reservation and release its spot.
    ///
    /// The status write and the counter decrement (floored at zero) are
    /// one atomic unit. Fails with a Conflict when the reservation is not
    /// in a cancellable state.
    async fn cancel(
        &self,
        id: &ReservationId,
        reason: Option<&str>,
        at: DateTime<Utc>,
    ) -> AppResult<Reservation>;

    /// Atomically re-point a reservation at a different session: release
    /// the old spot, take one on the target, update the reference.
    ///
    /// All three writes are one atomic unit; when the target is full the
    /// old session keeps its spot.
    async fn move_to_session(
        &self,
        id: &ReservationId,
        to: &GymSessionId,
    ) -> AppResult<Reservation>;

    /// Record attendance on a confirmed reservation, completing it.
    async fn record_attendance(
        &self,
        id: &ReservationId,
        attended: bool,
        recorder: &UserId,
        at: DateTime<Utc>,
    ) -> AppResult<Reservation>;
}

/// Durable ordered queue of waitlist entries per session.
#[async_trait]
pub trait WaitlistStore: Send + Sync + 'static {
    /// Find the entry for a (user, session) pair, if any.
    async fn find_entry(
        &self,
        user_id: &UserId,
        session_id: &GymSessionId,
    ) -> AppResult<Option<WaitlistEntry>>;

    /// All entries for a session, ordered by request time ascending.
    async fn find_by_session(&self, session_id: &GymSessionId) -> AppResult<Vec<WaitlistEntry>>;

    /// The earliest entry for the session that has not been notified yet.
    async fn next_pending(&self, session_id: &GymSessionId) -> AppResult<Option<WaitlistEntry>>;

    /// Persist a new entry with the current timestamp.
    async fn create(
        &self,
        user_id: &UserId,
        session_id: &GymSessionId,
    ) -> AppResult<WaitlistEntry>;

    /// Flip the notification flag on an entry. Returns `false` when the
    /// entry was already notified (or gone), so two concurrent promoters
    /// cannot both claim it.
    async fn mark_notified(&self, id: &WaitlistEntryId, at: DateTime<Utc>) -> AppResult<bool>;

    /// Remove the entry for a (user, session) pair. Returns whether any
    /// existed.
    async fn remove(&self, user_id: &UserId, session_id: &GymSessionId) -> AppResult<bool>;

    /// Remove all entries for a session (session cancellation). Returns
    /// the number removed.
    async fn remove_by_session(&self, session_id: &GymSessionId) -> AppResult<u64>;
}

/// Durable record of delivered notifications.
#[async_trait]
pub trait NotificationStore: Send + Sync + 'static {
    /// Persist a new notification.
    async fn create(&self, data: &CreateNotification) -> AppResult<Notification>;

    /// Paginated notifications for a user, newest first.
    async fn find_by_user(
        &self,
        user_id: &UserId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>>;

    /// Mark one of the user's notifications as read.
    async fn mark_read(
        &self,
        id: &NotificationId,
        user_id: &UserId,
        at: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Count the user's unread notifications.
    async fn count_unread(&self, user_id: &UserId) -> AppResult<i64>;
}
