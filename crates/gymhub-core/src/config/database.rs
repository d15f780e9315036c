//! Database configuration.

use serde::{Deserialize, Serialize};

/// PostgreSQL settings for the reservation store.
///
/// Booking and cancellation transactions are short (a conditional counter
/// update plus one row write), so the pool stays small by default; raise
/// `max_connections` only when many front-desk clients hit the backend at
/// once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL.
    pub url: String,
    /// Upper bound on pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Connections kept warm for the next booking burst.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// How long to wait for a free connection before giving up.
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_seconds: u64,
    /// Idle connection lifetime.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,
    /// Whether the server applies pending schema migrations on startup.
    /// Disable when migrations are rolled out separately from deploys.
    #[serde(default = "default_migrate_on_startup")]
    pub migrate_on_startup: bool,
}

fn default_max_connections() -> u32 {
    16
}

fn default_min_connections() -> u32 {
    2
}

fn default_acquire_timeout() -> u64 {
    5
}

fn default_idle_timeout() -> u64 {
    600
}

fn default_migrate_on_startup() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_in_everything_but_the_url() {
        let config: DatabaseConfig =
            serde_json::from_str(r#"{"url": "postgres://localhost/gymhub"}"#).expect("config");
        assert_eq!(config.max_connections, 16);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.acquire_timeout_seconds, 5);
        assert_eq!(config.idle_timeout_seconds, 600);
        assert!(config.migrate_on_startup);
    }
}
