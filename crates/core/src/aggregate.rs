//! Aggregate trait for event-sourced domain models.

/// Aggregate execution semantics (pure, deterministic).
///
/// - **Decision logic**: `handle(&self, cmd)` returns the events a command produces.
/// - **State mutation**: `apply(&mut self, seq, event)` evolves state.
///
/// Aggregates must not perform IO or side effects. They only return events
/// describing what happened; persisting them is the caller's job.
pub trait Aggregate {
    type Command: Clone + core::fmt::Debug;
    type Event: Clone + core::fmt::Debug;
    type Error: core::fmt::Debug;

    /// Evolve in-memory state from a single event stamped with its log
    /// sequence number.
    ///
    /// Applying the same sequence of events to a fresh aggregate must always
    /// produce the same state. An event the state cannot absorb (the stream
    /// contradicts itself) is reported as an error and leaves the state
    /// untouched.
    fn apply(&mut self, sequence_number: u64, event: &Self::Event) -> Result<(), Self::Error>;

    /// Decide which events to emit given the current state and a command.
    ///
    /// This must not mutate state. State evolution is done through `apply`.
    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;
}
