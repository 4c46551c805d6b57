use std::sync::RwLock;

use super::r#trait::{EventStore, EventStoreError, StoredEvent, UncommittedEvent, matches};

/// In-memory append-only event store.
///
/// Intended for tests/dev. Not durable; not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    events: RwLock<Vec<StoredEvent>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events recorded so far.
    pub fn len(&self) -> usize {
        self.events.read().map(|events| events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventStore for InMemoryEventStore {
    fn append(&self, event: UncommittedEvent) -> Result<StoredEvent, EventStoreError> {
        let mut events = self
            .events
            .write()
            .map_err(|_| EventStoreError::LockPoisoned)?;

        // Assign the sequence number under the write lock (no gaps, no duplicates).
        let next = events.last().map(|e| e.sequence_number).unwrap_or(0) + 1;
        let stored = StoredEvent::commit(event, next);
        events.push(stored.clone());

        Ok(stored)
    }

    fn load_after(&self, after: u64, event_types: &[&str]) -> Result<Vec<StoredEvent>, EventStoreError> {
        let events = self
            .events
            .read()
            .map_err(|_| EventStoreError::LockPoisoned)?;

        Ok(events
            .iter()
            .filter(|e| matches(e, after, event_types))
            .cloned()
            .collect())
    }

    fn last_sequence(&self) -> Result<u64, EventStoreError> {
        let events = self
            .events
            .read()
            .map_err(|_| EventStoreError::LockPoisoned)?;
        Ok(events.last().map(|e| e.sequence_number).unwrap_or(0))
    }
}
