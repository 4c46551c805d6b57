//! Append-only event store boundary.
//!
//! This module defines an infrastructure-facing abstraction for storing and
//! loading a globally sequenced event log, with an in-memory backend for tests
//! and a JSON-lines file backend for durable storage.

pub mod file;
pub mod in_memory;
pub mod r#trait;

pub use file::FileEventStore;
pub use in_memory::InMemoryEventStore;
pub use r#trait::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};
