use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An event as read back from the log, stamped with its log position.
///
/// Notes:
/// - **Append-only**: `sequence_number` is assigned by the log, is unique and
///   strictly increasing across the whole log.
/// - `recorded_at` is wall-clock metadata only; ordering always uses the
///   sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedEvent<E> {
    sequence_number: u64,
    recorded_at: DateTime<Utc>,
    payload: E,
}

impl<E> RecordedEvent<E> {
    pub fn new(sequence_number: u64, recorded_at: DateTime<Utc>, payload: E) -> Self {
        Self {
            sequence_number,
            recorded_at,
            payload,
        }
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }

    /// Keep the log metadata while narrowing or converting the payload.
    pub fn map<F>(self, f: impl FnOnce(E) -> F) -> RecordedEvent<F> {
        RecordedEvent {
            sequence_number: self.sequence_number,
            recorded_at: self.recorded_at,
            payload: f(self.payload),
        }
    }
}
