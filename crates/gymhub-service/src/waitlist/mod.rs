//! Waitlist engine: FIFO queueing and spot promotion.

mod service;

pub use service::WaitlistService;
