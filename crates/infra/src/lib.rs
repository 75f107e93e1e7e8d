//! Infrastructure for the club ledger: event store, command dispatch,
//! projections, the ledger service, scheduled jobs and configuration.

pub mod activity_log;
pub mod command_dispatcher;
pub mod config;
pub mod error;
pub mod event_store;
pub mod jobs;
pub mod ledger_service;
pub mod projections;
pub mod read_model;
pub mod sweep;


pub use activity_log::{ActivityLog, ActivityQuery, InMemoryActivityLog};
pub use config::{ConfigError, LedgerConfig};
pub use error::LedgerError;
pub use ledger_service::LedgerService;
pub use sweep::{SweepFailure, SweepReport};
