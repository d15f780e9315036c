//! Reservation status enumeration and transition table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a reservation.
///
/// The transition table is closed: `Pending`/`Confirmed` may move to
/// `Cancelled`, `Confirmed` may move to `Completed`, and nothing leaves
/// `Cancelled` or `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "reservation_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    /// Created but not yet confirmed.
    Pending,
    /// Spot is held; the entry state produced by booking.
    Confirmed,
    /// Cancelled by the holder; the spot was released.
    Cancelled,
    /// Attendance was recorded.
    Completed,
}

impl ReservationStatus {
    /// Check if the status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed)
    }

    /// Check if the reservation still holds a spot on its session.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    /// Check whether a transition to `next` is allowed.
    pub fn can_transition_to(&self, next: ReservationStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Cancelled)
                | (Self::Pending, Self::Confirmed)
                | (Self::Confirmed, Self::Cancelled)
                | (Self::Confirmed, Self::Completed)
        )
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = gymhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            _ => Err(gymhub_core::AppError::validation(format!(
                "Invalid reservation status: '{s}'. Expected one of: pending, confirmed, cancelled, completed"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table() {
        use ReservationStatus::*;
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Pending.can_transition_to(Confirmed));

        // Terminal states admit no transitions.
        for next in [Pending, Confirmed, Cancelled, Completed] {
            assert!(!Cancelled.can_transition_to(next));
            assert!(!Completed.can_transition_to(next));
        }
        assert!(!Confirmed.can_transition_to(Pending));
    }

    #[test]
    fn test_from_str() {
        let status: ReservationStatus = "CONFIRMED".parse().expect("parse");
        assert_eq!(status, ReservationStatus::Confirmed);
        assert!("no-such-status".parse::<ReservationStatus>().is_err());
    }
}
