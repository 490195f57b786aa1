//! Ordered event store shared between capture, playback, and persistence.
//!
//! Append order defines time order; nothing here validates or reorders.
//! Playback works off a snapshot, so the store is effectively read-only
//! while a run is active.

use crate::events::Event;
use parking_lot::RwLock;
use std::sync::Arc;

/// Cheaply clonable handle to the ordered event sequence.
#[derive(Clone, Default)]
pub struct EventStore {
    inner: Arc<RwLock<Vec<Event>>>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&self) {
        self.inner.write().clear();
    }

    pub fn append(&self, event: Event) {
        self.inner.write().push(event);
    }

    /// Wholesale replacement, used on load.
    pub fn replace(&self, events: Vec<Event>) {
        *self.inner.write() = events;
    }

    /// Owned copy of the current sequence.
    pub fn snapshot(&self) -> Vec<Event> {
        self.inner.read().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}
