//! Projection runner utilities.
//!
//! Read models are **disposable**; events are the source of truth.
//! This module provides deterministic replay and cursor tracking without
//! making storage assumptions.

use crate::{Projection, RecordedEvent};

/// Tracks how far a projection has consumed the log.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ProjectionCursor {
    last_sequence_number: u64,
    applied_events: u64,
}

impl ProjectionCursor {
    /// Sequence number of the last applied event (0 before any event).
    pub fn last_sequence_number(&self) -> u64 {
        self.last_sequence_number
    }

    /// Number of events applied since the runner was created.
    pub fn applied_events(&self) -> u64 {
        self.applied_events
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionError<E> {
    /// The event is not strictly after the cursor (duplicate, reordered, or 0).
    NonMonotonicSequence { last: u64, found: u64 },
    /// The projection refused the event.
    Rejected { sequence_number: u64, source: E },
}

impl<E: core::fmt::Display> core::fmt::Display for ProjectionError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ProjectionError::NonMonotonicSequence { last, found } => {
                write!(f, "non-monotonic sequence number (last={last}, found={found})")
            }
            ProjectionError::Rejected {
                sequence_number,
                source,
            } => write!(f, "event {sequence_number} rejected: {source}"),
        }
    }
}

impl<E> std::error::Error for ProjectionError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProjectionError::Rejected { source, .. } => Some(source),
            ProjectionError::NonMonotonicSequence { .. } => None,
        }
    }
}

/// Runs recorded events through a projection exactly once, in log order.
#[derive(Debug)]
pub struct ProjectionRunner<P>
where
    P: Projection,
{
    projection: P,
    cursor: ProjectionCursor,
}

impl<P> ProjectionRunner<P>
where
    P: Projection,
{
    pub fn new(projection: P) -> Self {
        Self {
            projection,
            cursor: ProjectionCursor::default(),
        }
    }

    pub fn projection(&self) -> &P {
        &self.projection
    }

    pub fn into_projection(self) -> P {
        self.projection
    }

    pub fn cursor(&self) -> ProjectionCursor {
        self.cursor
    }

    /// Apply a single event, enforcing strictly increasing sequence numbers.
    ///
    /// Gaps are allowed (the log may skip numbers after a failed append, and
    /// projections usually subscribe to a subset of event types); repeats and
    /// reorderings are not. The cursor only advances when the projection
    /// accepted the event.
    pub fn apply(&mut self, event: &RecordedEvent<P::Ev>) -> Result<(), ProjectionError<P::Error>> {
        let found = event.sequence_number();
        let last = self.cursor.last_sequence_number;
        if found == 0 || found <= last {
            return Err(ProjectionError::NonMonotonicSequence { last, found });
        }

        self.projection
            .apply(event)
            .map_err(|source| ProjectionError::Rejected {
                sequence_number: found,
                source,
            })?;

        self.cursor.last_sequence_number = found;
        self.cursor.applied_events += 1;
        Ok(())
    }

    /// Apply many events in order, stopping at the first failure.
    pub fn run<'a>(
        &mut self,
        events: impl IntoIterator<Item = &'a RecordedEvent<P::Ev>>,
    ) -> Result<(), ProjectionError<P::Error>>
    where
        P::Ev: 'a,
    {
        for event in events {
            self.apply(event)?;
        }
        Ok(())
    }

    /// Rebuild a projection from scratch by replaying the full event history.
    ///
    /// The factory is used to create a fresh projection instance.
    pub fn rebuild_from_scratch<'a>(
        factory: impl FnOnce() -> P,
        events: impl IntoIterator<Item = &'a RecordedEvent<P::Ev>>,
    ) -> Result<Self, ProjectionError<P::Error>>
    where
        P::Ev: 'a,
    {
        let mut runner = ProjectionRunner::new(factory());
        runner.run(events)?;
        Ok(runner)
    }
}
