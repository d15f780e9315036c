//! Notification engine: message templates and the persisting gateway.

pub mod messages;
mod service;

pub use service::NotificationService;
