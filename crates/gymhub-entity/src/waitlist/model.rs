//! Waitlist entry entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A member's place in the FIFO waitlist of a full session.
///
/// Ordering is strictly by `requested_at` ascending (entry id as
/// tiebreaker). Promotion only flips the notification flag; removal is a
/// separate explicit operation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WaitlistEntry {
    /// Unique entry identifier.
    pub id: Uuid,
    /// The waiting member.
    pub user_id: Uuid,
    /// The session being waited on.
    pub session_id: Uuid,
    /// When the member joined the waitlist. Immutable.
    pub requested_at: DateTime<Utc>,
    /// Whether the member has been told a spot opened up.
    pub notified: bool,
    /// When the spot-available notification was delivered.
    pub notified_at: Option<DateTime<Utc>>,
}

impl WaitlistEntry {
    /// Check whether this entry is still waiting for a spot.
    pub fn is_pending(&self) -> bool {
        !self.notified
    }
}

/// Aggregated view of a session's waitlist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitlistStats {
    /// Total number of entries.
    pub total_count: u64,
    /// Entries already notified of a free spot.
    pub notified_count: u64,
    /// Entries still waiting.
    pub pending_count: u64,
    /// Request time of the oldest entry (if any).
    pub oldest_request_at: Option<DateTime<Utc>>,
    /// Request time of the newest entry (if any).
    pub newest_request_at: Option<DateTime<Utc>>,
}
