//! Reservation policy configuration.

use serde::{Deserialize, Serialize};

/// Reservation engine policy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationConfig {
    /// Maximum number of active (non-cancelled) reservations per user.
    #[serde(default = "default_max_active")]
    pub max_active_per_user: u32,
}

impl Default for ReservationConfig {
    fn default() -> Self {
        Self {
            max_active_per_user: default_max_active(),
        }
    }
}

fn default_max_active() -> u32 {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limit() {
        assert_eq!(ReservationConfig::default().max_active_per_user, 3);
    }
}
