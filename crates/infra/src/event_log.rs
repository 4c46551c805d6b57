//! Typed event log: the three operations the ledger needs from storage.
//!
//! `TypedEventLog` layers typed events over any [`EventStore`]: payloads are
//! serialized on append and rebuilt through a [`TypeRegistry`] on read.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use ledger_events::{Event, EventDecoder, RecordedEvent};

use crate::event_store::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};
use crate::registry::TypeRegistry;

#[derive(Debug, Error)]
pub enum EventLogError {
    #[error(transparent)]
    Storage(#[from] EventStoreError),

    /// A stored type name has no registered decoder. Every name ever appended
    /// must have been registered by its writer, so this is an integrity error.
    #[error("unknown event type: {0}")]
    UnknownEventType(String),

    #[error("failed to decode {event_type} event {sequence_number}: {message}")]
    Decode {
        event_type: String,
        sequence_number: u64,
        message: String,
    },
}

/// Typed, append-only event log.
pub trait EventLog<E>: Send + Sync {
    /// Associate a stored type name with its decoder. Idempotent.
    fn register(&self, name: &str, decoder: EventDecoder<E>);

    /// Persist one event; the returned record carries its sequence number.
    fn append(&self, event: E) -> Result<RecordedEvent<E>, EventLogError>;

    /// Events of the given types recorded strictly after `after`, ascending.
    fn find_changes(&self, after: u64, names: &[&str]) -> Result<Vec<RecordedEvent<E>>, EventLogError>;
}

impl<E, L> EventLog<E> for Arc<L>
where
    L: EventLog<E> + ?Sized,
{
    fn register(&self, name: &str, decoder: EventDecoder<E>) {
        (**self).register(name, decoder)
    }

    fn append(&self, event: E) -> Result<RecordedEvent<E>, EventLogError> {
        (**self).append(event)
    }

    fn find_changes(&self, after: u64, names: &[&str]) -> Result<Vec<RecordedEvent<E>>, EventLogError> {
        (**self).find_changes(after, names)
    }
}

/// [`EventLog`] implementation over a JSON-level [`EventStore`].
pub struct TypedEventLog<S, E> {
    store: S,
    registry: TypeRegistry<E>,
    _event: PhantomData<fn() -> E>,
}

impl<S, E> core::fmt::Debug for TypedEventLog<S, E>
where
    S: core::fmt::Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TypedEventLog")
            .field("store", &self.store)
            .field("registry", &self.registry)
            .finish()
    }
}

impl<S, E> TypedEventLog<S, E> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            registry: TypeRegistry::new(),
            _event: PhantomData,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn registry(&self) -> &TypeRegistry<E> {
        &self.registry
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn decode(&self, stored: StoredEvent) -> Result<RecordedEvent<E>, EventLogError> {
        let decoder = self
            .registry
            .decoder(&stored.event_type)
            .ok_or_else(|| EventLogError::UnknownEventType(stored.event_type.clone()))?;

        let payload = decoder(stored.payload).map_err(|e| EventLogError::Decode {
            event_type: stored.event_type,
            sequence_number: stored.sequence_number,
            message: e.to_string(),
        })?;

        Ok(RecordedEvent::new(stored.sequence_number, stored.recorded_at, payload))
    }
}

impl<S, E> EventLog<E> for TypedEventLog<S, E>
where
    S: EventStore,
    E: Event + Serialize,
{
    fn register(&self, name: &str, decoder: EventDecoder<E>) {
        if self.registry.register(name, decoder) {
            debug!(event_type = name, "registered event type");
        }
    }

    fn append(&self, event: E) -> Result<RecordedEvent<E>, EventLogError> {
        let uncommitted = UncommittedEvent::from_typed(&event)?;
        let stored = self.store.append(uncommitted)?;
        debug!(
            event_type = %stored.event_type,
            sequence_number = stored.sequence_number,
            "appended event"
        );
        Ok(RecordedEvent::new(stored.sequence_number, stored.recorded_at, event))
    }

    fn find_changes(&self, after: u64, names: &[&str]) -> Result<Vec<RecordedEvent<E>>, EventLogError> {
        self.store
            .load_after(after, names)?
            .into_iter()
            .map(|stored| self.decode(stored))
            .collect()
    }
}
