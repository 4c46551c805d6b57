use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use ledger_events::Event;
use std::sync::Arc;

/// An event ready to be appended to the log (not yet assigned a sequence number).
///
/// Built from a typed event with [`UncommittedEvent::from_typed`], which
/// serializes the payload and captures the type name needed to decode it later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UncommittedEvent {
    pub event_type: String,
    pub event_version: u32,
    pub payload: JsonValue,
}

/// A stored event in the append-only log (assigned a sequence number).
///
/// ## Sequence Numbers
///
/// Sequence numbers are assigned by the event store during append and are:
/// - **Global**: one counter for the whole log, starting at 1
/// - **Strictly increasing**: each committed event gets `last + 1`
/// - **Immutable**: once assigned, sequence numbers never change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub sequence_number: u64,

    pub event_type: String,
    pub event_version: u32,
    pub recorded_at: DateTime<Utc>,

    pub payload: JsonValue,
}

impl StoredEvent {
    pub(crate) fn commit(event: UncommittedEvent, sequence_number: u64) -> Self {
        Self {
            sequence_number,
            event_type: event.event_type,
            event_version: event.event_version,
            recorded_at: Utc::now(),
            payload: event.payload,
        }
    }
}

/// Event store operation error.
///
/// These are **infrastructure errors** (IO, encoding, damaged files) as opposed
/// to domain errors (validation, invariants).
#[derive(Debug, Error)]
pub enum EventStoreError {
    #[error("event store io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("event serialization failed: {0}")]
    Serialization(String),

    #[error("event log is corrupt at line {line}: {message}")]
    Corrupt { line: usize, message: String },

    #[error("event store lock poisoned")]
    LockPoisoned,
}

/// Append-only, globally sequenced event store.
///
/// The `EventStore` is the **persistence layer** for events. It only knows
/// about JSON payloads and type names; turning payloads back into typed events
/// is the job of [`crate::event_log::TypedEventLog`].
///
/// ## Append Semantics
///
/// `append()`:
/// - Assigns the next sequence number atomically with the write
/// - Persists the event before returning (durable backends)
/// - On failure nothing is observable: later reads never see the event and the
///   sequence number is not consumed
///
/// ## Load Semantics
///
/// `load_after()`:
/// - Returns events with `sequence_number > after` whose type is in `event_types`
/// - Events are returned in ascending sequence number order
/// - An empty `event_types` slice matches nothing
///
/// ## Implementation Requirements
///
/// Implementations must handle concurrent appends correctly: no two events may
/// share a sequence number and racing appends must not leave gaps.
pub trait EventStore: Send + Sync {
    /// Append one event, returning it with its assigned sequence number.
    fn append(&self, event: UncommittedEvent) -> Result<StoredEvent, EventStoreError>;

    /// Load events of the given types recorded after `after`.
    fn load_after(&self, after: u64, event_types: &[&str]) -> Result<Vec<StoredEvent>, EventStoreError>;

    /// Highest sequence number assigned so far (0 for an empty log).
    fn last_sequence(&self) -> Result<u64, EventStoreError>;
}

impl<S> EventStore for Arc<S>
where
    S: EventStore + ?Sized,
{
    fn append(&self, event: UncommittedEvent) -> Result<StoredEvent, EventStoreError> {
        (**self).append(event)
    }

    fn load_after(&self, after: u64, event_types: &[&str]) -> Result<Vec<StoredEvent>, EventStoreError> {
        (**self).load_after(after, event_types)
    }

    fn last_sequence(&self) -> Result<u64, EventStoreError> {
        (**self).last_sequence()
    }
}

impl<S> EventStore for Box<S>
where
    S: EventStore + ?Sized,
{
    fn append(&self, event: UncommittedEvent) -> Result<StoredEvent, EventStoreError> {
        (**self).append(event)
    }

    fn load_after(&self, after: u64, event_types: &[&str]) -> Result<Vec<StoredEvent>, EventStoreError> {
        (**self).load_after(after, event_types)
    }

    fn last_sequence(&self) -> Result<u64, EventStoreError> {
        (**self).last_sequence()
    }
}

impl UncommittedEvent {
    /// Convenience constructor from a typed event.
    ///
    /// Keeps infra decoupled from the domain, while still capturing the type
    /// name needed for future deserialization.
    pub fn from_typed<E>(event: &E) -> Result<Self, EventStoreError>
    where
        E: Event + Serialize,
    {
        let payload = serde_json::to_value(event)
            .map_err(|e| EventStoreError::Serialization(format!("payload serialization failed: {e}")))?;

        Ok(Self {
            event_type: event.event_type().to_string(),
            event_version: event.version(),
            payload,
        })
    }
}

/// Shared filter used by the backends.
pub(crate) fn matches(stored: &StoredEvent, after: u64, event_types: &[&str]) -> bool {
    stored.sequence_number > after && event_types.contains(&stored.event_type.as_str())
}
