use crate::{Event, RecordedEvent};

/// A projection builds a read model from an append-only event stream.
///
/// Projections transform events (the write model) into queryable state. The
/// state is disposable: it can be dropped and rebuilt by replaying the log from
/// sequence 0 at any time, so the log stays the single source of truth.
///
/// ## Determinism
///
/// `apply` must be a pure fold step: the same events, applied in the same
/// order to a fresh projection, must always produce the same state. Do not
/// read clocks, random sources or anything outside the recorded event.
///
/// ## Error Handling
///
/// An event that contradicts the current state (for example a transaction
/// naming an account that was never opened) means the log itself is
/// inconsistent. `apply` reports it and must leave the state unchanged; the
/// caller decides whether that is fatal (it is during startup replay).
///
/// Sequencing (monotonic order, exactly-once) is enforced by
/// [`crate::ProjectionRunner`], not by the projection.
pub trait Projection {
    type Ev: Event;
    type Error: core::fmt::Debug;

    /// Apply a single recorded event to the projection.
    fn apply(&mut self, event: &RecordedEvent<Self::Ev>) -> Result<(), Self::Error>;
}
