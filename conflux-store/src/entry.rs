//! Per-key cache records.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use conflux_core::{ResolutionStatus, TransportError};

/// Monotonic generation counter for one key.
///
/// Every in-flight operation is tagged with the generation of the entry it
/// was triggered under. A reset bumps the generation, so a result arriving
/// from a discarded generation can be recognized and dropped instead of
/// repopulating the just-cleared entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

/// Per-key record of cached value, error, and lifecycle status.
///
/// # Invariants
///
/// - `Done` implies `value` is present and `error` absent.
/// - `Errored` implies `error` is present and `value` absent.
/// - The only transition out of a terminal status is [`CacheEntry::reset`],
///   which also bumps the generation.
///
/// These hold by construction: all transitions go through the methods below,
/// and each terminal transition writes the one field its status requires and
/// clears the other.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    value: Option<Arc<T>>,
    error: Option<TransportError>,
    status: ResolutionStatus,
    generation: Generation,
    fetched_at: Option<DateTime<Utc>>,
}

impl<T> Default for CacheEntry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CacheEntry<T> {
    /// A fresh entry: `NotStarted`, generation zero, nothing cached.
    pub fn new() -> Self {
        Self {
            value: None,
            error: None,
            status: ResolutionStatus::NotStarted,
            generation: Generation::new(),
            fetched_at: None,
        }
    }

    pub fn status(&self) -> ResolutionStatus {
        self.status
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// When the current terminal result was committed, if any.
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    /// The cached value, regardless of status.
    pub fn value(&self) -> Option<Arc<T>> {
        self.value.clone()
    }

    /// Borrow the cached value, for reducer input.
    pub fn value_ref(&self) -> Option<&T> {
        self.value.as_deref()
    }

    /// The cached error, if the entry is errored.
    pub fn error(&self) -> Option<&TransportError> {
        self.error.as_ref()
    }

    /// The terminal result, or `None` if the entry is not terminal.
    pub fn outcome(&self) -> Option<Result<Arc<T>, TransportError>> {
        match self.status {
            ResolutionStatus::Done => self.value.clone().map(Ok),
            ResolutionStatus::Errored => self.error.clone().map(Err),
            _ => None,
        }
    }

    /// Mark the operation started. Idempotent on an already in-flight entry.
    pub fn mark_in_flight(&mut self) {
        self.status = ResolutionStatus::InFlight;
    }

    /// Commit a successful result: `Done`, value present, error cleared.
    pub fn complete(&mut self, value: Arc<T>) {
        self.value = Some(value);
        self.error = None;
        self.status = ResolutionStatus::Done;
        self.fetched_at = Some(Utc::now());
    }

    /// Commit a failure: `Errored`, error present, value cleared.
    pub fn fail(&mut self, error: TransportError) {
        self.value = None;
        self.error = Some(error);
        self.status = ResolutionStatus::Errored;
        self.fetched_at = Some(Utc::now());
    }

    /// Revert an in-flight entry whose owning call was dropped before it
    /// could commit.
    ///
    /// Keeps the generation: the dropped call produces no result, so there
    /// is nothing stale to fence off. The next resolve re-triggers.
    pub fn abandon(&mut self) {
        self.status = ResolutionStatus::NotStarted;
    }

    /// Clear the entry back to `NotStarted` under a new generation.
    ///
    /// An operation already in flight is not cancelled; its eventual result
    /// carries the old generation and is discarded at commit time.
    pub fn reset(&mut self) {
        self.value = None;
        self.error = None;
        self.status = ResolutionStatus::NotStarted;
        self.generation = self.generation.next();
        self.fetched_at = None;
    }
}

// =============================================================================
// TESTS
// =============================================================================
