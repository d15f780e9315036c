//! User directory backed by the users table.

use async_trait::async_trait;
use sqlx::PgPool;

use gymhub_core::error::{AppError, ErrorKind};
use gymhub_core::result::AppResult;
use gymhub_core::traits::directory::UserDirectory;
use gymhub_core::types::id::UserId;

/// Existence checks against the users table.
///
/// The user subsystem itself (profiles, progress tracking) lives outside
/// the reservation core; this repository only answers the narrow contract
/// the engines need.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for UserRepository {
    async fn user_exists(&self, user_id: &UserId) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(*user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to check user", e))
    }
}
