/// A domain-agnostic event.
///
/// Events are:
/// - **immutable** (treat them as facts)
/// - **versioned** (schema evolution)
/// - designed to be **append-only**
///
/// Ordering and timestamps are not part of the event itself; the log assigns
/// them when the event is recorded (see [`crate::RecordedEvent`]).
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name/type identifier (e.g. "account.opened").
    fn event_type(&self) -> &'static str;

    /// Schema version for this event type.
    fn version(&self) -> u32 {
        1
    }
}

/// Reconstructs a concrete event from the JSON payload stored under one type name.
///
/// Plain function pointers keep registries `Send + Sync` and cheap to copy.
pub type EventDecoder<E> = fn(serde_json::Value) -> Result<E, serde_json::Error>;
