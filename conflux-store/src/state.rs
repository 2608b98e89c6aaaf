//! The state container: all cache entries for one store.
//!
//! Exclusively owned by its resolution store and never mutated by callers
//! directly; the coordinator holds it behind the store mutex and commits
//! every mutation through here. The paired [`RevisionChannel`] ticks after
//! each committed mutation so suspended waiters re-check and resume.

use std::collections::HashMap;

use conflux_core::{ResolutionKey, ResolutionStatus, TransportError};
use tokio::sync::watch;

use crate::entry::CacheEntry;

/// Cache entries for one store, keyed by resolution key.
///
/// Map semantics give the "exactly one entry per distinct key" invariant for
/// free; a reset mutates the existing entry in place rather than removing it,
/// so the entry's generation history survives for stale-result detection.
#[derive(Debug)]
pub struct StateContainer<T> {
    entries: HashMap<ResolutionKey, CacheEntry<T>>,
}

impl<T> Default for StateContainer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> StateContainer<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Read an entry. No side effects.
    pub fn get(&self, key: &ResolutionKey) -> Option<&CacheEntry<T>> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &ResolutionKey) -> Option<&mut CacheEntry<T>> {
        self.entries.get_mut(key)
    }

    /// The entry for `key`, created fresh if absent.
    pub fn entry_or_insert(&mut self, key: ResolutionKey) -> &mut CacheEntry<T> {
        self.entries.entry(key).or_default()
    }

    /// Replace an entry wholesale. Last write wins.
    pub fn put(&mut self, key: ResolutionKey, entry: CacheEntry<T>) {
        self.entries.insert(key, entry);
    }

    pub fn remove(&mut self, key: &ResolutionKey) -> Option<CacheEntry<T>> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // ------------------------------------------------------------------
    // Derived read selectors
    // ------------------------------------------------------------------

    /// Status for a key. An absent entry reads as `NotStarted`.
    pub fn status(&self, key: &ResolutionKey) -> ResolutionStatus {
        self.entries
            .get(key)
            .map(|e| e.status())
            .unwrap_or(ResolutionStatus::NotStarted)
    }

    pub fn is_in_flight(&self, key: &ResolutionKey) -> bool {
        self.status(key).is_in_flight()
    }

    /// Whether any key in this store is currently in flight.
    pub fn any_in_flight(&self) -> bool {
        self.entries.values().any(|e| e.status().is_in_flight())
    }

    pub fn in_flight_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| e.status().is_in_flight())
            .count()
    }

    pub fn error_for(&self, key: &ResolutionKey) -> Option<TransportError> {
        self.entries.get(key).and_then(|e| e.error().cloned())
    }

    /// Reset every entry back to `NotStarted`, bumping each generation.
    pub fn reset_all(&mut self) {
        for entry in self.entries.values_mut() {
            entry.reset();
        }
    }
}

/// Revision channel waiters observe.
///
/// A bare counter over `tokio::sync::watch`: the coordinator ticks it after
/// every committed mutation, waiters subscribe before reading state and
/// re-check on every tick. Subscribing first is what closes the missed-wakeup
/// window: a commit that lands between the state read and the await marks the
/// subscription changed, so the wait returns immediately.
#[derive(Debug)]
pub struct RevisionChannel {
    tx: watch::Sender<u64>,
}

impl Default for RevisionChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl RevisionChannel {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx }
    }

    /// Announce a committed mutation.
    pub fn tick(&self) {
        self.tx.send_modify(|revision| *revision += 1);
    }

    /// A receiver whose `changed()` resolves on the next tick.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> u64 {
        *self.tx.borrow()
    }
}

// =============================================================================
// TESTS
// =============================================================================
