//! Recurring background jobs.
//!
//! ## Components
//!
//! - `DailySchedule`: fixed UTC times of day
//! - `JobScheduler`: runs handlers when their slot comes up
//! - `JobSchedulerHandle`: shutdown and run history of a spawned scheduler
//!
//! A slot missed while the process was down or busy is run once on the next
//! tick, never replayed per missed slot.

pub mod scheduler;
pub mod types;

pub use scheduler::{JobHandler, JobScheduler, JobSchedulerConfig, JobSchedulerHandle};
pub use types::{DailySchedule, JobKind, JobResult, JobRunRecord, ScheduleError, ScheduledJob};
