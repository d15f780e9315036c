//! PostgreSQL repository implementations of the store contracts.

pub mod equipment;
pub mod notification;
pub mod reservation;
pub mod session;
pub mod user;
pub mod waitlist;

pub use equipment::EquipmentRepository;
pub use notification::NotificationRepository;
pub use reservation::ReservationRepository;
pub use session::SessionRepository;
pub use user::UserRepository;
pub use waitlist::WaitlistRepository;
