//! Entities: things with an identity that outlives any single balance change.

/// An identified, versioned piece of projected state.
pub trait Entity {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;

    /// Sequence number of the last event that touched this entity.
    fn version(&self) -> u64;
}
