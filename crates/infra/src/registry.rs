//! Event type registry: stored type name → decoder.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use ledger_events::EventDecoder;

/// Maps the type names found in the log to the decoders that rebuild them.
///
/// Registration is idempotent (the first decoder registered under a name
/// wins) and safe from several threads. The map only ever grows, so a lock
/// poisoned by a panicking reader is recovered rather than propagated.
pub struct TypeRegistry<E> {
    decoders: RwLock<HashMap<String, EventDecoder<E>>>,
}

impl<E> Default for TypeRegistry<E> {
    fn default() -> Self {
        Self {
            decoders: RwLock::new(HashMap::new()),
        }
    }
}

impl<E> core::fmt::Debug for TypeRegistry<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("names", &self.names())
            .finish()
    }
}

impl<E> TypeRegistry<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `decoder` for `name`. Returns `false` if the name was already
    /// registered, in which case the existing decoder is kept.
    pub fn register(&self, name: &str, decoder: EventDecoder<E>) -> bool {
        let mut decoders = self.decoders.write().unwrap_or_else(PoisonError::into_inner);
        if decoders.contains_key(name) {
            return false;
        }
        decoders.insert(name.to_string(), decoder);
        true
    }

    pub fn decoder(&self, name: &str) -> Option<EventDecoder<E>> {
        self.decoders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .copied()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.decoder(name).is_some()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .decoders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}
