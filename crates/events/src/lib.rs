//! Event abstractions shared by the domain and the infrastructure layers.

pub mod envelope;
pub mod event;
pub mod projection;
pub mod runner;

pub use envelope::RecordedEvent;
pub use event::{Event, EventDecoder};
pub use projection::Projection;
pub use runner::{ProjectionCursor, ProjectionError, ProjectionRunner};
