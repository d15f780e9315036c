//! Notification gateway contract.

use std::fmt;

use async_trait::async_trait;
use uuid::Uuid;

use crate::types::id::{GymSessionId, ReservationId, UserId};

/// Category of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationCategory {
    /// Reservation lifecycle messages (confirmed, cancelled, updated).
    Reservation,
    /// Waitlist messages (spot available).
    Waitlist,
    /// Session schedule messages (session cancelled, rescheduled).
    Session,
    /// Attendance messages (attendance recorded, marked absent).
    Attendance,
}

impl NotificationCategory {
    /// Return the category as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reservation => "reservation",
            Self::Waitlist => "waitlist",
            Self::Session => "session",
            Self::Attendance => "attendance",
        }
    }
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Delivery channel for user-facing messages.
///
/// All methods are fire-and-report: `true` means delivered, `false` means
/// not delivered. Implementations log transport failures and convert them
/// to `false`; they never surface an error to the calling engine. The
/// triggering business operation has already committed its state change by
/// the time a notification is sent.
#[async_trait]
pub trait NotificationGateway: Send + Sync + 'static {
    /// Deliver a free-form notification to a user.
    async fn notify(
        &self,
        user_id: &UserId,
        title: &str,
        message: &str,
        category: NotificationCategory,
        reference_id: Option<Uuid>,
    ) -> bool;

    /// Tell a waitlisted user that a spot has opened up in a session.
    async fn spot_available(&self, user_id: &UserId, session_id: &GymSessionId) -> bool;

    /// Confirm a freshly created reservation to its holder.
    async fn reservation_confirmation(
        &self,
        user_id: &UserId,
        reservation_id: &ReservationId,
    ) -> bool;
}
