//! Mutation stores: the fetch machinery minus caching.
//!
//! Writes (create-property and friends) validate, describe a request, and
//! decode a response exactly like fetch operations, but dispatches are never
//! deduplicated - two dispatches are two calls - and nothing is cached
//! beyond the last error per key, for the UI's inline error affordance.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use conflux_core::{
    encode_args, ArgValue, ConfluxResult, EncodingError, Payload, ResolutionKey, StoreError,
    Transport, TransportError, TransportRequest, ValidationError,
};
use tracing::debug;

/// One write against the transport.
///
/// Same contracts as `FetchOperation` for the pieces it shares; no reducer,
/// because nothing is cached.
pub trait MutationOperation: Send + Sync + 'static {
    type Args: Clone + Send + Sync + 'static;
    type Output: Send + Sync + 'static;

    fn name(&self) -> &'static str;

    /// Synchronous precondition check; an invalid argument means zero calls.
    fn validate(&self, args: &Self::Args) -> Result<(), ValidationError>;

    /// The values dispatch bookkeeping is keyed by.
    fn key_args(&self, args: &Self::Args) -> Result<Vec<ArgValue>, EncodingError>;

    fn request(&self, args: &Self::Args) -> TransportRequest;

    fn decode(&self, payload: Payload) -> Result<Self::Output, TransportError>;
}

#[derive(Debug, Default)]
struct MutationState {
    in_flight: HashMap<ResolutionKey, usize>,
    last_error: HashMap<ResolutionKey, TransportError>,
}

struct Inner<M: MutationOperation> {
    op: Arc<M>,
    transport: Arc<dyn Transport>,
    state: Mutex<MutationState>,
}

/// Decrements the per-key in-flight count when the dispatch ends, whether it
/// ran to completion or its future was dropped mid-call. Straight-line
/// decrement after the await would leak the count on cancellation and pin
/// `is_doing` at true forever.
struct DispatchGuard<M: MutationOperation> {
    inner: Arc<Inner<M>>,
    key: ResolutionKey,
}

impl<M: MutationOperation> Drop for DispatchGuard<M> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.inner.state.lock() {
            if let Some(count) = state.in_flight.get_mut(&self.key) {
                *count = count.saturating_sub(1);
            }
        }
    }
}

/// Dispatch store for one mutation operation.
///
/// Cheap to clone; clones share bookkeeping.
pub struct MutationStore<M: MutationOperation> {
    inner: Arc<Inner<M>>,
}

impl<M: MutationOperation> Clone for MutationStore<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M: MutationOperation> MutationStore<M> {
    pub fn new(op: Arc<M>, transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: Arc::new(Inner {
                op,
                transport,
                state: Mutex::new(MutationState::default()),
            }),
        }
    }

    fn key_for(&self, args: &M::Args) -> ConfluxResult<ResolutionKey> {
        Ok(encode_args(&self.inner.op.key_args(args)?)?)
    }

    fn lock(&self) -> ConfluxResult<MutexGuard<'_, MutationState>> {
        self.inner
            .state
            .lock()
            .map_err(|_| StoreError::LockPoisoned.into())
    }

    /// Perform the write.
    ///
    /// Validates synchronously, clears any previous error for the key, makes
    /// exactly one call, and records the outcome. Dispatches are not
    /// deduplicated.
    pub async fn dispatch(&self, args: &M::Args) -> ConfluxResult<M::Output> {
        self.inner.op.validate(args)?;
        let key = self.key_for(args)?;

        {
            let mut state = self.lock()?;
            *state.in_flight.entry(key.clone()).or_insert(0) += 1;
            state.last_error.remove(&key);
        }
        let guard = DispatchGuard {
            inner: Arc::clone(&self.inner),
            key: key.clone(),
        };

        debug!(
            op = self.inner.op.name(),
            key = %key.short_digest(),
            "dispatch start"
        );

        let request = self.inner.op.request(args);
        let result = match self.inner.transport.perform(&request).await {
            Ok(payload) => self.inner.op.decode(payload),
            Err(error) => Err(error),
        };
        drop(guard);

        let mut state = self.lock()?;
        match result {
            Ok(output) => Ok(output),
            Err(error) => {
                state.last_error.insert(key, error.clone());
                Err(error.into())
            }
        }
    }

    /// Whether any dispatch for these arguments is currently in flight.
    pub fn is_doing(&self, args: &M::Args) -> ConfluxResult<bool> {
        let key = self.key_for(args)?;
        Ok(self.lock()?.in_flight.get(&key).copied().unwrap_or(0) > 0)
    }

    /// The most recent dispatch error for these arguments, if any.
    pub fn error_for(&self, args: &M::Args) -> ConfluxResult<Option<TransportError>> {
        let key = self.key_for(args)?;
        Ok(self.lock()?.last_error.get(&key).cloned())
    }

    /// Drop the recorded error for these arguments.
    pub fn clear_error(&self, args: &M::Args) -> ConfluxResult<()> {
        let key = self.key_for(args)?;
        self.lock()?.last_error.remove(&key);
        Ok(())
    }
}

impl<M: MutationOperation> std::fmt::Debug for MutationStore<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationStore")
            .field("op", &self.inner.op.name())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
