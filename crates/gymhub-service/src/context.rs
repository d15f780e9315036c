//! Request context carrying the acting user.

use gymhub_core::types::id::UserId;

/// Identity of the member performing an operation.
///
/// Authentication itself happens outside this core; by the time a request
/// reaches an engine the caller has already been resolved to a user ID.
/// Ownership checks (a member may only cancel or reschedule their own
/// reservations) compare against this.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext {
    /// The acting member.
    pub user_id: UserId,
}

impl RequestContext {
    /// Create a context for the given member.
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}
