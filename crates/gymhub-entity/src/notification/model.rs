//! Notification entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A notification delivered to a member.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    /// Unique notification identifier.
    pub id: Uuid,
    /// The recipient member.
    pub user_id: Uuid,
    /// Notification category (reservation, waitlist, session, attendance).
    pub category: String,
    /// Notification title.
    pub title: String,
    /// Notification body text.
    pub message: String,
    /// Resource the notification refers to (reservation or session id).
    pub reference_id: Option<Uuid>,
    /// Whether the member has read this notification.
    pub is_read: bool,
    /// When the notification was read.
    pub read_at: Option<DateTime<Utc>>,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Check if the notification has not been read yet.
    pub fn is_unread(&self) -> bool {
        !self.is_read
    }
}

/// Data required to create a new notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNotification {
    /// The recipient member.
    pub user_id: Uuid,
    /// Notification category.
    pub category: String,
    /// Notification title.
    pub title: String,
    /// Notification body text.
    pub message: String,
    /// Resource the notification refers to.
    pub reference_id: Option<Uuid>,
}
