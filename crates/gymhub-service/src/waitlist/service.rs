//! FIFO waitlist engine.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use gymhub_core::error::AppError;
use gymhub_core::result::AppResult;
use gymhub_core::traits::directory::UserDirectory;
use gymhub_core::traits::notifier::NotificationGateway;
use gymhub_core::types::id::{GymSessionId, UserId, WaitlistEntryId};
use gymhub_database::store::{SessionStore, WaitlistStore};
use gymhub_entity::waitlist::{WaitlistEntry, WaitlistStats};

/// Waitlist engine.
///
/// Entries are strictly FIFO by request time. Promotion (`notify_next`)
/// never books on the member's behalf; it only tells the front of the queue
/// that a spot opened up, and the member races for it like everyone else.
pub struct WaitlistService {
    sessions: Arc<dyn SessionStore>,
    waitlist: Arc<dyn WaitlistStore>,
    users: Arc<dyn UserDirectory>,
    gateway: Arc<dyn NotificationGateway>,
    /// Per-session promotion locks. Two concurrent `notify_next` calls for
    /// the same session must not both claim the head entry.
    promotion_locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl WaitlistService {
    /// Create a new waitlist engine.
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        waitlist: Arc<dyn WaitlistStore>,
        users: Arc<dyn UserDirectory>,
        gateway: Arc<dyn NotificationGateway>,
    ) -> Self {
        Self {
            sessions,
            waitlist,
            users,
            gateway,
            promotion_locks: DashMap::new(),
        }
    }

    /// Put a member on a session's waitlist.
    ///
    /// Idempotent per (user, session): joining twice returns the existing
    /// entry with its original request time, so re-joining cannot be used
    /// to jump the queue.
    pub async fn join(
        &self,
        user_id: &UserId,
        session_id: &GymSessionId,
    ) -> AppResult<WaitlistEntry> {
        if let Some(existing) = self.waitlist.find_entry(user_id, session_id).await? {
            debug!(user_id = %user_id, session_id = %session_id, "Already on waitlist");
            return Ok(existing);
        }
        if !self.users.user_exists(user_id).await? {
            return Err(AppError::not_found("User not found"));
        }
        if self.sessions.find_by_id(session_id).await?.is_none() {
            return Err(AppError::not_found("Session not found"));
        }

        let entry = self.waitlist.create(user_id, session_id).await?;
        info!(user_id = %user_id, session_id = %session_id, "Joined waitlist");
        Ok(entry)
    }

    /// 1-based position of a member in a session's queue, 0 when absent.
    pub async fn position(
        &self,
        user_id: &UserId,
        session_id: &GymSessionId,
    ) -> AppResult<u32> {
        let entries = self.waitlist.find_by_session(session_id).await?;
        let rank = entries
            .iter()
            .position(|entry| entry.user_id == *user_id.as_uuid())
            .map(|index| index as u32 + 1)
            .unwrap_or(0);
        Ok(rank)
    }

    /// Offer a freed spot to the front of the queue.
    ///
    /// Returns `true` when an entry was notified and marked. Returns
    /// `false` when the queue is empty or delivery failed; a failed
    /// delivery leaves the entry un-notified so the next call retries the
    /// same member rather than skipping them.
    pub async fn notify_next(&self, session_id: &GymSessionId) -> AppResult<bool> {
        let lock = self
            .promotion_locks
            .entry(session_id.into_uuid())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let Some(entry) = self.waitlist.next_pending(session_id).await? else {
            return Ok(false);
        };

        let user_id = UserId::from_uuid(entry.user_id);
        if !self.gateway.spot_available(&user_id, session_id).await {
            warn!(
                user_id = %user_id,
                session_id = %session_id,
                "Spot-available delivery failed; entry left for retry"
            );
            return Ok(false);
        }

        let claimed = self
            .waitlist
            .mark_notified(&WaitlistEntryId::from_uuid(entry.id), Utc::now())
            .await?;
        if claimed {
            info!(user_id = %user_id, session_id = %session_id, "Waitlist entry promoted");
        }
        Ok(claimed)
    }

    /// Take a member off a session's waitlist. Returns whether an entry
    /// existed.
    pub async fn leave(
        &self,
        user_id: &UserId,
        session_id: &GymSessionId,
    ) -> AppResult<bool> {
        let removed = self.waitlist.remove(user_id, session_id).await?;
        if removed {
            info!(user_id = %user_id, session_id = %session_id, "Left waitlist");
        }
        Ok(removed)
    }

    /// Aggregate view of a session's queue.
    pub async fn stats(&self, session_id: &GymSessionId) -> AppResult<WaitlistStats> {
        let entries = self.waitlist.find_by_session(session_id).await?;
        let notified_count = entries.iter().filter(|entry| entry.notified).count() as u64;
        let total_count = entries.len() as u64;
        Ok(WaitlistStats {
            total_count,
            notified_count,
            pending_count: total_count - notified_count,
            oldest_request_at: entries.first().map(|entry| entry.requested_at),
            newest_request_at: entries.last().map(|entry| entry.requested_at),
        })
    }
}

#[cfg(test)]
mod tests {
    use gymhub_core::error::ErrorKind;

    use crate::testutil::Harness;

    use super::*;

    #[tokio::test]
    async fn test_join_is_fifo_and_idempotent() {
        let h = Harness::new();
        let session = h.session("2026-09-07", "09:00:00", "10:00:00", 1).await;
        let first = h.member().await;
        let second = h.member().await;

        let entry = h.waitlist.join(&first, &session).await.unwrap();
        h.waitlist.join(&second, &session).await.unwrap();

        // Re-joining returns the original entry, keeping the original rank.
        let again = h.waitlist.join(&first, &session).await.unwrap();
        assert_eq!(again.id, entry.id);
        assert_eq!(again.requested_at, entry.requested_at);

        assert_eq!(h.waitlist.position(&first, &session).await.unwrap(), 1);
        assert_eq!(h.waitlist.position(&second, &session).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_join_requires_known_user_and_session() {
        let h = Harness::new();
        let session = h.session("2026-09-07", "09:00:00", "10:00:00", 1).await;

        let err = h
            .waitlist
            .join(&UserId::new(), &session)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        let member = h.member().await;
        let err = h
            .waitlist
            .join(&member, &GymSessionId::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_leave_reranks_remaining_entries() {
        let h = Harness::new();
        let session = h.session("2026-09-07", "09:00:00", "10:00:00", 1).await;
        let first = h.member().await;
        let second = h.member().await;
        h.waitlist.join(&first, &session).await.unwrap();
        h.waitlist.join(&second, &session).await.unwrap();

        assert!(h.waitlist.leave(&first, &session).await.unwrap());
        assert!(!h.waitlist.leave(&first, &session).await.unwrap());
        assert_eq!(h.waitlist.position(&second, &session).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_notify_next_promotes_in_order() {
        let h = Harness::new();
        let session = h.session("2026-09-07", "09:00:00", "10:00:00", 1).await;
        let first = h.member().await;
        let second = h.member().await;
        h.waitlist.join(&first, &session).await.unwrap();
        h.waitlist.join(&second, &session).await.unwrap();

        assert!(h.waitlist.notify_next(&session).await.unwrap());
        let sent = h.gateway.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].user_id, first.into_uuid());

        assert!(h.waitlist.notify_next(&session).await.unwrap());
        let sent = h.gateway.sent().await;
        assert_eq!(sent[1].user_id, second.into_uuid());

        // Queue exhausted.
        assert!(!h.waitlist.notify_next(&session).await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_delivery_retries_same_entry() {
        let h = Harness::new();
        let session = h.session("2026-09-07", "09:00:00", "10:00:00", 1).await;
        let first = h.member().await;
        let second = h.member().await;
        h.waitlist.join(&first, &session).await.unwrap();
        h.waitlist.join(&second, &session).await.unwrap();

        h.gateway.set_failing(true);
        assert!(!h.waitlist.notify_next(&session).await.unwrap());

        // The head entry was not consumed by the failed attempt.
        h.gateway.set_failing(false);
        assert!(h.waitlist.notify_next(&session).await.unwrap());
        let sent = h.gateway.sent().await;
        assert_eq!(sent.last().unwrap().user_id, first.into_uuid());
    }

    #[tokio::test]
    async fn test_stats_counts_notified_and_pending() {
        let h = Harness::new();
        let session = h.session("2026-09-07", "09:00:00", "10:00:00", 1).await;
        let first = h.member().await;
        let second = h.member().await;
        let entry = h.waitlist.join(&first, &session).await.unwrap();
        h.waitlist.join(&second, &session).await.unwrap();

        h.waitlist.notify_next(&session).await.unwrap();

        let stats = h.waitlist.stats(&session).await.unwrap();
        assert_eq!(stats.total_count, 2);
        assert_eq!(stats.notified_count, 1);
        assert_eq!(stats.pending_count, 1);
        assert_eq!(stats.oldest_request_at, Some(entry.requested_at));
    }
}
