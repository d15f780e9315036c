//! User-facing message templates.
//!
//! Each builder returns a `(title, message)` pair. Wording lives here so
//! the engines stay free of copy text.

use gymhub_core::types::id::{GymSessionId, ReservationId};

/// A freshly booked reservation.
pub fn reservation_confirmed(reservation_id: &ReservationId) -> (String, String) {
    (
        "Reservation confirmed".to_string(),
        format!("Your reservation {reservation_id} is confirmed. See you at the gym!"),
    )
}

/// A reservation the member (or the gym) cancelled.
pub fn reservation_cancelled(reason: Option<&str>) -> (String, String) {
    let message = match reason {
        Some(reason) => format!("Your reservation has been cancelled: {reason}"),
        None => "Your reservation has been cancelled.".to_string(),
    };
    ("Reservation cancelled".to_string(), message)
}

/// A reservation moved to a different time window.
pub fn reservation_moved(session: &GymSessionId) -> (String, String) {
    (
        "Reservation updated".to_string(),
        format!("Your reservation has been moved to session {session}."),
    )
}

/// A spot opened up in a session the member is waiting on.
pub fn spot_available(session: &GymSessionId) -> (String, String) {
    (
        "Spot available".to_string(),
        format!(
            "A spot has opened up in session {session}. Book now before someone else does!"
        ),
    )
}

/// Attendance recorded for a completed reservation.
pub fn attendance_recorded(attended: bool) -> (String, String) {
    if attended {
        (
            "Attendance recorded".to_string(),
            "Thanks for coming in. Your attendance has been recorded.".to_string(),
        )
    } else {
        (
            "Marked absent".to_string(),
            "You were marked absent for your reserved session.".to_string(),
        )
    }
}

/// A whole session cancelled by the gym.
pub fn session_cancelled(reason: Option<&str>) -> (String, String) {
    let message = match reason {
        Some(reason) => format!("A session you were booked into has been cancelled: {reason}"),
        None => "A session you were booked into has been cancelled.".to_string(),
    };
    ("Session cancelled".to_string(), message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_reason_is_included() {
        let (_, message) = reservation_cancelled(Some("trainer unavailable"));
        assert!(message.contains("trainer unavailable"));
        let (_, message) = reservation_cancelled(None);
        assert!(message.ends_with("cancelled."));
    }

    #[test]
    fn test_attendance_variants() {
        let (title, _) = attendance_recorded(true);
        assert_eq!(title, "Attendance recorded");
        let (title, _) = attendance_recorded(false);
        assert_eq!(title, "Marked absent");
    }
}
