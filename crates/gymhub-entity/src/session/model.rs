//! Gym session entity model.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A scheduled gym session with a fixed capacity.
///
/// The `reserved_spots` counter is mutated on every reservation and
/// cancellation and must never exceed `capacity`. All counter mutations go
/// through the store layer, which applies them as conditional updates so
/// that two concurrent bookings cannot both take the last spot.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GymSession {
    /// Unique session identifier.
    pub id: Uuid,
    /// Calendar date of the session.
    pub session_date: NaiveDate,
    /// Start of the time window.
    pub start_time: NaiveTime,
    /// End of the time window (strictly after `start_time`).
    pub end_time: NaiveTime,
    /// Maximum number of participants.
    pub capacity: i32,
    /// Number of spots currently reserved (0 ..= capacity).
    pub reserved_spots: i32,
    /// Trainer leading the session (if assigned).
    pub trainer_id: Option<Uuid>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session was last updated.
    pub updated_at: DateTime<Utc>,
}

impl GymSession {
    /// Check whether at least one spot is still free.
    pub fn has_capacity(&self) -> bool {
        self.reserved_spots < self.capacity
    }

    /// Number of spots still free.
    pub fn remaining_spots(&self) -> i32 {
        (self.capacity - self.reserved_spots).max(0)
    }

    /// The moment the session begins.
    pub fn starts_at(&self) -> NaiveDateTime {
        self.session_date.and_time(self.start_time)
    }

    /// Check whether the session has already started at the given instant.
    pub fn has_started(&self, now: NaiveDateTime) -> bool {
        self.starts_at() <= now
    }

    /// Check whether this session's window overlaps the given window on
    /// the same date.
    ///
    /// The comparison is strict, so back-to-back sessions (one ending
    /// exactly when the next begins) do not overlap.
    pub fn overlaps(&self, date: NaiveDate, start: NaiveTime, end: NaiveTime) -> bool {
        self.session_date == date && self.start_time < end && self.end_time > start
    }

    /// Occupancy of this single session as a whole-number percentage.
    pub fn occupancy_percent(&self) -> u32 {
        if self.capacity <= 0 {
            return 0;
        }
        (self.reserved_spots.max(0) as u32 * 100) / self.capacity as u32
    }
}

/// Data required to create a new gym session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGymSession {
    /// Calendar date of the session.
    pub session_date: NaiveDate,
    /// Start of the time window.
    pub start_time: NaiveTime,
    /// End of the time window.
    pub end_time: NaiveTime,
    /// Maximum number of participants.
    pub capacity: i32,
    /// Trainer leading the session (if assigned).
    pub trainer_id: Option<Uuid>,
}

/// Data for rescheduling an existing session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUpdate {
    /// New calendar date.
    pub session_date: NaiveDate,
    /// New start time.
    pub start_time: NaiveTime,
    /// New end time.
    pub end_time: NaiveTime,
    /// New capacity.
    pub capacity: i32,
    /// New trainer assignment.
    pub trainer_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(start: &str, end: &str, capacity: i32, reserved: i32) -> GymSession {
        GymSession {
            id: Uuid::new_v4(),
            session_date: "2026-09-07".parse().expect("date"),
            start_time: start.parse().expect("start"),
            end_time: end.parse().expect("end"),
            capacity,
            reserved_spots: reserved,
            trainer_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_has_capacity() {
        assert!(session("09:00:00", "10:00:00", 2, 1).has_capacity());
        assert!(!session("09:00:00", "10:00:00", 2, 2).has_capacity());
    }

    #[test]
    fn test_overlap_is_strict() {
        let s = session("09:00:00", "10:00:00", 10, 0);
        let date = s.session_date;
        // Partial overlap.
        assert!(s.overlaps(date, "09:30:00".parse().unwrap(), "10:30:00".parse().unwrap()));
        // Back-to-back windows do not overlap.
        assert!(!s.overlaps(date, "10:00:00".parse().unwrap(), "11:00:00".parse().unwrap()));
        // Different date never overlaps.
        assert!(!s.overlaps(
            "2026-09-08".parse().unwrap(),
            "09:00:00".parse().unwrap(),
            "10:00:00".parse().unwrap()
        ));
    }

    #[test]
    fn test_occupancy_percent() {
        assert_eq!(session("09:00:00", "10:00:00", 10, 4).occupancy_percent(), 40);
        assert_eq!(session("09:00:00", "10:00:00", 3, 3).occupancy_percent(), 100);
    }
}
