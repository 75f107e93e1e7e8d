//! Append-only event store boundary.
//!
//! Storage-agnostic: the in-memory implementation serves tests and the
//! single-process server; a durable backend implements the same trait.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryEventStore;
pub use r#trait::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};
