//! Schedule engine: session planning, cancellation, occupancy.

mod service;

pub use service::ScheduleService;
