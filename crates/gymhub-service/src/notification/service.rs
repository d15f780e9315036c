//! Persisting notification gateway.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use gymhub_core::error::AppError;
use gymhub_core::result::AppResult;
use gymhub_core::traits::notifier::{NotificationCategory, NotificationGateway};
use gymhub_core::types::id::{GymSessionId, NotificationId, ReservationId, UserId};
use gymhub_core::types::pagination::{PageRequest, PageResponse};
use gymhub_database::store::NotificationStore;
use gymhub_entity::notification::{CreateNotification, Notification};

use super::messages;

/// In-process notification delivery.
///
/// "Delivery" means persisting a [`Notification`] row the member's client
/// polls for. Gateway methods report success as `bool` and never propagate
/// errors: by the time a notification goes out, the business operation that
/// triggered it has already committed, so a failed delivery must not fail
/// the operation.
#[derive(Clone)]
pub struct NotificationService {
    store: Arc<dyn NotificationStore>,
}

impl NotificationService {
    /// Create a new notification service on top of a store.
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self { store }
    }

    /// Paginated notification feed for a member, newest first.
    pub async fn list_for_user(
        &self,
        user_id: &UserId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>> {
        self.store.find_by_user(user_id, page).await
    }

    /// Number of notifications the member has not read yet.
    pub async fn unread_count(&self, user_id: &UserId) -> AppResult<i64> {
        self.store.count_unread(user_id).await
    }

    /// Mark one of the member's notifications as read.
    pub async fn mark_read(&self, user_id: &UserId, id: &NotificationId) -> AppResult<()> {
        if self.store.mark_read(id, user_id, Utc::now()).await? {
            Ok(())
        } else {
            Err(AppError::not_found("Notification not found"))
        }
    }
}

#[async_trait]
impl NotificationGateway for NotificationService {
    async fn notify(
        &self,
        user_id: &UserId,
        title: &str,
        message: &str,
        category: NotificationCategory,
        reference_id: Option<Uuid>,
    ) -> bool {
        let data = CreateNotification {
            user_id: user_id.into_uuid(),
            category: category.as_str().to_string(),
            title: title.to_string(),
            message: message.to_string(),
            reference_id,
        };
        match self.store.create(&data).await {
            Ok(notification) => {
                debug!(
                    user_id = %user_id,
                    notification_id = %notification.id,
                    %category,
                    "Notification delivered"
                );
                true
            }
            Err(err) => {
                warn!(user_id = %user_id, %category, error = %err, "Notification delivery failed");
                false
            }
        }
    }

    async fn spot_available(&self, user_id: &UserId, session_id: &GymSessionId) -> bool {
        let (title, message) = messages::spot_available(session_id);
        self.notify(
            user_id,
            &title,
            &message,
            NotificationCategory::Waitlist,
            Some(session_id.into_uuid()),
        )
        .await
    }

    async fn reservation_confirmation(
        &self,
        user_id: &UserId,
        reservation_id: &ReservationId,
    ) -> bool {
        let (title, message) = messages::reservation_confirmed(reservation_id);
        self.notify(
            user_id,
            &title,
            &message,
            NotificationCategory::Reservation,
            Some(reservation_id.into_uuid()),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use gymhub_database::memory::MemoryStore;

    use super::*;

    fn service() -> NotificationService {
        NotificationService::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_notify_persists_a_row() {
        let service = service();
        let user = UserId::new();
        let session = GymSessionId::new();

        assert!(service.spot_available(&user, &session).await);

        let page = service
            .list_for_user(&user, &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].category, "waitlist");
        assert_eq!(page.items[0].reference_id, Some(session.into_uuid()));
        assert_eq!(service.unread_count(&user).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_mark_read_rejects_foreign_notification() {
        let service = service();
        let owner = UserId::new();
        let other = UserId::new();
        let reservation = ReservationId::new();

        assert!(service.reservation_confirmation(&owner, &reservation).await);
        let page = service
            .list_for_user(&owner, &PageRequest::default())
            .await
            .unwrap();
        let id = NotificationId::from_uuid(page.items[0].id);

        let err = service.mark_read(&other, &id).await.unwrap_err();
        assert_eq!(err.kind, gymhub_core::error::ErrorKind::NotFound);

        service.mark_read(&owner, &id).await.unwrap();
        assert_eq!(service.unread_count(&owner).await.unwrap(), 0);
    }
}
