//! Reservation entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::ReservationStatus;

/// A member's booking of a spot in a gym session.
///
/// Reservations are never physically deleted; cancellation and completion
/// are status transitions. Every transition into `Cancelled` is paired
/// with a decrement of the owning session's reserved-spots counter in the
/// same atomic unit.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Reservation {
    /// Unique reservation identifier.
    pub id: Uuid,
    /// The member who holds the spot.
    pub user_id: Uuid,
    /// The session the spot belongs to.
    pub session_id: Uuid,
    /// Lifecycle status.
    pub status: ReservationStatus,
    /// When the reservation was made.
    pub reserved_at: DateTime<Utc>,
    /// Equipment attached to this reservation (validated at booking time).
    pub equipment_ids: Vec<Uuid>,

    // -- Cancellation --
    /// Reason given on cancellation.
    pub cancellation_reason: Option<String>,
    /// When the reservation was cancelled.
    pub cancelled_at: Option<DateTime<Utc>>,

    // -- Attendance --
    /// Whether the member showed up (set when attendance is recorded).
    pub attended: Option<bool>,
    /// When the member checked in.
    pub checked_in_at: Option<DateTime<Utc>>,
    /// Who recorded the attendance.
    pub completed_by: Option<Uuid>,
    /// When attendance was recorded.
    pub completed_at: Option<DateTime<Utc>>,

    /// Free-form notes.
    pub notes: Option<String>,
}

impl Reservation {
    /// Check whether the reservation still holds a spot on its session.
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Check whether the reservation has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.status == ReservationStatus::Cancelled
    }
}

/// Data required to book a new reservation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReservation {
    /// The member booking the spot.
    pub user_id: Uuid,
    /// The session being booked.
    pub session_id: Uuid,
    /// Equipment to attach (already validated by the engine).
    pub equipment_ids: Vec<Uuid>,
    /// Free-form notes.
    pub notes: Option<String>,
}
