//! Shared fixtures for engine tests: an in-memory backend wired into all
//! four engines, plus a recording notification gateway.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use gymhub_core::config::reservation::ReservationConfig;
use gymhub_core::traits::notifier::{NotificationCategory, NotificationGateway};
use gymhub_core::types::id::{GymSessionId, ReservationId, UserId};
use gymhub_database::memory::{MemoryEquipmentCatalog, MemoryStore, MemoryUserDirectory};
use gymhub_database::store::SessionStore;
use gymhub_entity::session::CreateGymSession;

use crate::notification::messages;
use crate::reservation::ReservationService;
use crate::schedule::ScheduleService;
use crate::waitlist::WaitlistService;

/// One message captured by the recording gateway.
#[derive(Debug, Clone)]
pub(crate) struct SentMessage {
    pub user_id: Uuid,
    pub title: String,
    #[allow(dead_code)]
    pub category: NotificationCategory,
}

/// Gateway double that records every delivery and can be told to fail.
#[derive(Default)]
pub(crate) struct RecordingGateway {
    failing: AtomicBool,
    sent: Mutex<Vec<SentMessage>>,
}

impl RecordingGateway {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl NotificationGateway for RecordingGateway {
    async fn notify(
        &self,
        user_id: &UserId,
        title: &str,
        _message: &str,
        category: NotificationCategory,
        _reference_id: Option<Uuid>,
    ) -> bool {
        if self.failing.load(Ordering::SeqCst) {
            return false;
        }
        self.sent.lock().await.push(SentMessage {
            user_id: user_id.into_uuid(),
            title: title.to_string(),
            category,
        });
        true
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

/// All four engines over one in-memory backend.
pub(crate) struct Harness {
    pub store: Arc<MemoryStore>,
    pub users: Arc<MemoryUserDirectory>,
    pub equipment: Arc<MemoryEquipmentCatalog>,
    pub gateway: Arc<RecordingGateway>,
    pub waitlist: Arc<WaitlistService>,
    pub reservations: ReservationService,
    pub schedule: ScheduleService,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let users = Arc::new(MemoryUserDirectory::new());
        let equipment = Arc::new(MemoryEquipmentCatalog::new());
        let gateway = Arc::new(RecordingGateway::default());

        let waitlist = Arc::new(WaitlistService::new(
            store.clone(),
            store.clone(),
            users.clone(),
            gateway.clone(),
        ));
        let reservations = ReservationService::new(
            store.clone(),
            store.clone(),
            users.clone(),
            equipment.clone(),
            gateway.clone(),
            waitlist.clone(),
            ReservationConfig::default(),
        );
        let schedule = ScheduleService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            gateway.clone(),
        );

        Self {
            store,
            users,
            equipment,
            gateway,
            waitlist,
            reservations,
            schedule,
        }
    }

    /// Register a fresh member in the directory.
    pub async fn member(&self) -> UserId {
        let user_id = UserId::new();
        self.users.register(user_id).await;
        user_id
    }

    /// Create a session directly in the store, bypassing overlap checks.
    pub async fn session(
        &self,
        date: &str,
        start: &str,
        end: &str,
        capacity: i32,
    ) -> GymSessionId {
        let session = SessionStore::create(
            &*self.store,
            &CreateGymSession {
                session_date: date.parse().expect("date"),
                start_time: start.parse().expect("start"),
                end_time: end.parse().expect("end"),
                capacity,
                trainer_id: None,
            },
        )
        .await
        .expect("session create");
        GymSessionId::from_uuid(session.id)
    }
}
