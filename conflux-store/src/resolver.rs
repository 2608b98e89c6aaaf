//! The resolution coordinator.
//!
//! Decides, per key, whether to invoke the fetch operation, subscribe to an
//! in-flight one, or return the cached result immediately; exposes the
//! suspend-until-terminal wait primitive.
//!
//! # Locking
//!
//! One mutex per store guards the state container. It is held only across
//! the trigger/await/return decision and across result commits - never
//! across the network call, which runs unlocked. The revision channel ticks
//! after each commit, inside the same logical step, so no waiter observes a
//! stale `InFlight` after the transition has been committed and none misses
//! the wakeup.

use std::sync::{Arc, Mutex, MutexGuard};

use conflux_core::{
    encode_args, ConfluxError, ConfluxResult, ResolutionKey, ResolutionStatus, StoreError,
    Transport, TransportError,
};
use tracing::debug;

use crate::entry::Generation;
use crate::fetch::FetchOperation;
use crate::state::{RevisionChannel, StateContainer};

/// The per-key effect `resolve` decided on, computed under the store mutex.
enum Plan<T> {
    /// A terminal entry exists; return its result without any call.
    Cached(Result<Arc<T>, TransportError>),
    /// Another caller's operation is in flight; await the same transition.
    AwaitExisting,
    /// This caller marked the entry in flight and owns the one call,
    /// tagged with the generation it was triggered under.
    TriggerFetch(Generation),
}

struct Inner<F: FetchOperation> {
    op: Arc<F>,
    transport: Arc<dyn Transport>,
    state: Mutex<StateContainer<F::Output>>,
    revision: RevisionChannel,
}

/// Reverts an entry this caller marked in flight if the caller's future is
/// dropped before the result commits.
///
/// The owning resolve runs the network call inside its own future, so a
/// timeout, task abort, or lost `select!` branch can drop it mid-call. The
/// entry must not stay `InFlight` in that case; reverting it and ticking the
/// revision channel lets a waiter re-decide and take over the trigger.
struct FetchGuard<F: FetchOperation> {
    inner: Arc<Inner<F>>,
    key: ResolutionKey,
    generation: Generation,
    committed: bool,
}

impl<F: FetchOperation> FetchGuard<F> {
    fn disarm(mut self) {
        self.committed = true;
    }
}

impl<F: FetchOperation> Drop for FetchGuard<F> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        // A poisoned lock is unrecoverable here either way; skip the revert.
        if let Ok(mut state) = self.inner.state.lock() {
            if let Some(entry) = state.get_mut(&self.key) {
                if entry.generation() == self.generation && entry.status().is_in_flight() {
                    entry.abandon();
                }
            }
        }
        self.inner.revision.tick();
    }
}

/// Keyed async resolution store for one fetch operation.
///
/// Cheap to clone; clones share state. One store instance per logical
/// domain, created at composition time and handed by reference to whoever
/// reads from it.
pub struct ResolutionStore<F: FetchOperation> {
    inner: Arc<Inner<F>>,
}

impl<F: FetchOperation> Clone for ResolutionStore<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: FetchOperation> ResolutionStore<F> {
    pub fn new(op: Arc<F>, transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: Arc::new(Inner {
                op,
                transport,
                state: Mutex::new(StateContainer::new()),
                revision: RevisionChannel::new(),
            }),
        }
    }

    /// The resolution key for an argument tuple.
    pub fn key_for(&self, args: &F::Args) -> ConfluxResult<ResolutionKey> {
        Ok(encode_args(&self.inner.op.key_args(args)?)?)
    }

    fn lock(&self) -> ConfluxResult<MutexGuard<'_, StateContainer<F::Output>>> {
        self.inner
            .state
            .lock()
            .map_err(|_| StoreError::LockPoisoned.into())
    }

    // ------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------

    /// Resolve the value for an argument tuple.
    ///
    /// Validates synchronously, then per key: a terminal entry returns
    /// immediately (a cached error re-surfaces without re-fetching), an
    /// in-flight entry is awaited, otherwise this call marks the entry in
    /// flight and performs the one network call. Concurrent resolves of the
    /// same key all observe the same terminal result from a single call.
    pub async fn resolve(&self, args: &F::Args) -> ConfluxResult<Arc<F::Output>> {
        self.inner.op.validate(args)?;
        let key = self.key_for(args)?;

        loop {
            // Subscribe before the decision so a commit landing between the
            // state read and the await still wakes us.
            let mut revision = self.inner.revision.subscribe();

            let plan = {
                let mut state = self.lock()?;
                let entry = state.entry_or_insert(key.clone());
                if let Some(outcome) = entry.outcome() {
                    Plan::Cached(outcome)
                } else if entry.status().is_in_flight() {
                    Plan::AwaitExisting
                } else {
                    entry.mark_in_flight();
                    Plan::TriggerFetch(entry.generation())
                }
            };

            match plan {
                Plan::Cached(Ok(value)) => return Ok(value),
                Plan::Cached(Err(error)) => return Err(error.into()),
                Plan::TriggerFetch(generation) => {
                    debug!(
                        op = self.inner.op.name(),
                        key = %key.short_digest(),
                        "fetch start"
                    );
                    let guard = FetchGuard {
                        inner: Arc::clone(&self.inner),
                        key: key.clone(),
                        generation,
                        committed: false,
                    };
                    let result = self.perform(args).await;
                    guard.disarm();
                    return self.commit(&key, generation, result, args);
                }
                Plan::AwaitExisting => {
                    // A closed channel means the store was dropped mid-wait;
                    // loop once more and read whatever state remains.
                    let _ = revision.changed().await;
                }
            }
        }
    }

    /// Non-blocking read of the cached value. Never triggers a fetch.
    ///
    /// Returns `Ok(None)` while the key is unresolved or in flight; a cached
    /// error re-surfaces as `Err`.
    pub fn try_get(&self, args: &F::Args) -> ConfluxResult<Option<Arc<F::Output>>> {
        let key = self.key_for(args)?;
        let state = self.lock()?;
        match state.get(&key).and_then(|entry| entry.outcome()) {
            Some(Ok(value)) => Ok(Some(value)),
            Some(Err(error)) => Err(error.into()),
            None => Ok(None),
        }
    }

    /// Trigger resolution without waiting for it.
    ///
    /// Validates synchronously, then spawns the resolve; the caller is
    /// expected to re-read later. Failures land in the cache entry like any
    /// other resolve.
    pub fn prefetch(&self, args: F::Args) -> ConfluxResult<()> {
        self.inner.op.validate(&args)?;
        let store = self.clone();
        tokio::spawn(async move {
            if let Err(error) = store.resolve(&args).await {
                debug!(
                    op = store.inner.op.name(),
                    %error,
                    "prefetch resolution failed"
                );
            }
        });
        Ok(())
    }

    /// Suspend until the key reaches a terminal status.
    ///
    /// Triggers resolution if nothing has for this key. Resolves on *either*
    /// terminal status - waiting is about completion, not success; read the
    /// value or error afterwards. All simultaneous waiters on one key resume
    /// on the same committed transition, with zero additional fetches.
    pub async fn wait_for(&self, args: &F::Args) -> ConfluxResult<()> {
        match self.resolve(args).await {
            Ok(_) => Ok(()),
            Err(ConfluxError::Transport(_)) => Ok(()),
            Err(other) => Err(other),
        }
    }

    async fn perform(&self, args: &F::Args) -> Result<F::Output, TransportError> {
        let request = self.inner.op.request(args);
        let payload = self.inner.transport.perform(&request).await?;
        self.inner.op.decode(payload)
    }

    /// Commit a fetch result, unless the entry moved to a new generation
    /// while the call was in flight.
    fn commit(
        &self,
        key: &ResolutionKey,
        generation: Generation,
        result: Result<F::Output, TransportError>,
        args: &F::Args,
    ) -> ConfluxResult<Arc<F::Output>> {
        let mut state = self.lock()?;

        let current = state.get(key).map(|entry| entry.generation());
        if current != Some(generation) {
            // Reset raced this fetch; the caller still gets its result, the
            // entry stays untouched for the new generation to fill.
            drop(state);
            debug!(
                op = self.inner.op.name(),
                key = %key.short_digest(),
                "discarding result from superseded generation"
            );
            return match result {
                Ok(output) => Ok(Arc::new(output)),
                Err(error) => Err(error.into()),
            };
        }

        let outcome = match state.get_mut(key) {
            Some(entry) => match result {
                Ok(output) => {
                    let reduced = self.inner.op.reduce(entry.value_ref(), output, args);
                    let value = Arc::new(reduced);
                    entry.complete(Arc::clone(&value));
                    Ok(value)
                }
                Err(error) => {
                    entry.fail(error.clone());
                    Err(error.into())
                }
            },
            // Unreachable given the generation check above; kept total.
            None => match result {
                Ok(output) => Ok(Arc::new(output)),
                Err(error) => Err(error.into()),
            },
        };

        drop(state);
        self.inner.revision.tick();
        debug!(
            op = self.inner.op.name(),
            key = %key.short_digest(),
            ok = outcome.is_ok(),
            "fetch commit"
        );
        outcome
    }

    // ------------------------------------------------------------------
    // Invalidation & sanctioned injection
    // ------------------------------------------------------------------

    /// Clear a key back to `NotStarted` under a new generation.
    ///
    /// Never cancels an operation already in flight; its eventual result
    /// carries the superseded generation and is discarded at commit time
    /// instead of repopulating the cleared entry.
    pub fn reset(&self, args: &F::Args) -> ConfluxResult<()> {
        let key = self.key_for(args)?;
        {
            let mut state = self.lock()?;
            if let Some(entry) = state.get_mut(&key) {
                entry.reset();
            }
        }
        self.inner.revision.tick();
        Ok(())
    }

    /// Reset every key in the store.
    pub fn reset_all(&self) -> ConfluxResult<()> {
        {
            let mut state = self.lock()?;
            state.reset_all();
        }
        self.inner.revision.tick();
        Ok(())
    }

    /// Inject a terminal value for a key without a network call.
    ///
    /// Goes through the same reducer and commit path a fetch does; this is
    /// how mutations and tests feed state.
    pub fn receive(&self, args: &F::Args, output: F::Output) -> ConfluxResult<Arc<F::Output>> {
        let key = self.key_for(args)?;
        let value = {
            let mut state = self.lock()?;
            let entry = state.entry_or_insert(key);
            let reduced = self.inner.op.reduce(entry.value_ref(), output, args);
            let value = Arc::new(reduced);
            entry.complete(Arc::clone(&value));
            value
        };
        self.inner.revision.tick();
        Ok(value)
    }

    /// Inject a terminal error for a key without a network call.
    pub fn receive_error(&self, args: &F::Args, error: TransportError) -> ConfluxResult<()> {
        let key = self.key_for(args)?;
        {
            let mut state = self.lock()?;
            state.entry_or_insert(key).fail(error);
        }
        self.inner.revision.tick();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read selectors
    // ------------------------------------------------------------------

    /// Status for an argument tuple. An absent entry reads as `NotStarted`.
    pub fn status(&self, args: &F::Args) -> ConfluxResult<ResolutionStatus> {
        let key = self.key_for(args)?;
        Ok(self.lock()?.status(&key))
    }

    /// Whether a fetch for these arguments is currently in flight.
    pub fn is_fetching(&self, args: &F::Args) -> ConfluxResult<bool> {
        Ok(self.status(args)?.is_in_flight())
    }

    /// Whether the key has reached a terminal status.
    pub fn has_finished(&self, args: &F::Args) -> ConfluxResult<bool> {
        Ok(self.status(args)?.is_terminal())
    }

    /// The cached terminal error for these arguments, if any.
    pub fn error_for(&self, args: &F::Args) -> ConfluxResult<Option<TransportError>> {
        let key = self.key_for(args)?;
        Ok(self.lock()?.error_for(&key))
    }

    /// Whether any key in this store is in flight.
    pub fn any_fetching(&self) -> ConfluxResult<bool> {
        Ok(self.lock()?.any_in_flight())
    }

    pub fn in_flight_count(&self) -> ConfluxResult<usize> {
        Ok(self.lock()?.in_flight_count())
    }
}

impl<F: FetchOperation> std::fmt::Debug for ResolutionStore<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionStore")
            .field("op", &self.inner.op.name())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use conflux_core::{
        ArgValue, EncodingError, Payload, TransportRequest, ValidationError,
    };
    use conflux_test_utils::MockTransport;
    use serde_json::json;
    use std::time::Duration;

    /// Fetches the body of a URL; the doubly-keyed analogue used across the
    /// engine tests.
    struct GetBody;

    impl FetchOperation for GetBody {
        type Args = String;
        type Output = String;

        fn name(&self) -> &'static str {
            "getBody"
        }

        fn validate(&self, args: &String) -> Result<(), ValidationError> {
            if args.starts_with("https://") || args.starts_with("http://") {
                Ok(())
            } else {
                Err(ValidationError::InvalidValue {
                    field: "url".to_string(),
                    reason: "must be an absolute http(s) URL".to_string(),
                })
            }
        }

        fn key_args(&self, args: &String) -> Result<Vec<ArgValue>, EncodingError> {
            Ok(vec![json!(args)])
        }

        fn request(&self, args: &String) -> TransportRequest {
            TransportRequest::absolute(args.clone())
        }

        fn decode(&self, payload: Payload) -> Result<String, TransportError> {
            payload.into_text()
        }
    }

    fn store_with(transport: &Arc<MockTransport>) -> ResolutionStore<GetBody> {
        ResolutionStore::new(Arc::new(GetBody), Arc::clone(transport) as Arc<dyn Transport>)
    }

    const URL: &str = "https://example.com";

    #[tokio::test]
    async fn test_first_resolve_fetches_and_caches() {
        let transport = Arc::new(MockTransport::new());
        transport.respond_absolute(URL, Ok(Payload::Text("<html>body</html>".to_string())));
        let store = store_with(&transport);

        assert_eq!(
            store.status(&URL.to_string()).expect("status"),
            ResolutionStatus::NotStarted
        );

        let value = store.resolve(&URL.to_string()).await.expect("resolve");
        assert_eq!(*value, "<html>body</html>");
        assert_eq!(
            store.status(&URL.to_string()).expect("status"),
            ResolutionStatus::Done
        );
        assert_eq!(transport.calls_for_absolute(URL), 1);
    }

    #[tokio::test]
    async fn test_done_is_idempotent_until_reset() {
        let transport = Arc::new(MockTransport::new());
        transport.respond_absolute(URL, Ok(Payload::Text("one".to_string())));
        transport.respond_absolute(URL, Ok(Payload::Text("two".to_string())));
        let store = store_with(&transport);

        let first = store.resolve(&URL.to_string()).await.expect("resolve");
        let second = store.resolve(&URL.to_string()).await.expect("resolve");
        assert_eq!(*first, "one");
        assert_eq!(*second, "one");
        assert_eq!(transport.calls_for_absolute(URL), 1);

        store.reset(&URL.to_string()).expect("reset");
        let third = store.resolve(&URL.to_string()).await.expect("resolve");
        assert_eq!(*third, "two");
        assert_eq!(transport.calls_for_absolute(URL), 2);
    }

    #[tokio::test]
    async fn test_concurrent_resolves_share_one_fetch() {
        let transport = Arc::new(MockTransport::new());
        transport.respond_absolute(URL, Ok(Payload::Text("shared".to_string())));
        transport.hold();
        let store = store_with(&transport);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(
                async move { store.resolve(&URL.to_string()).await },
            ));
        }

        // Let every task reach its decision against the held transport.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(store.in_flight_count().expect("count"), 1);
        transport.release();

        for joined in futures_util::future::join_all(handles).await {
            let value = joined.expect("join").expect("resolve");
            assert_eq!(*value, "shared");
        }
        assert_eq!(transport.calls_for_absolute(URL), 1);
    }

    #[tokio::test]
    async fn test_waiters_resume_on_same_transition() {
        let transport = Arc::new(MockTransport::new());
        transport.respond_absolute(URL, Ok(Payload::Text("body".to_string())));
        transport.hold();
        let store = store_with(&transport);

        let first = {
            let store = store.clone();
            tokio::spawn(async move { store.wait_for(&URL.to_string()).await })
        };
        let second = {
            let store = store.clone();
            tokio::spawn(async move { store.wait_for(&URL.to_string()).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(store.is_fetching(&URL.to_string()).expect("fetching"));
        transport.release();

        first.await.expect("join").expect("wait");
        second.await.expect("join").expect("wait");
        assert!(store.has_finished(&URL.to_string()).expect("finished"));
        assert_eq!(transport.calls_for_absolute(URL), 1);
    }

    #[tokio::test]
    async fn test_validation_error_is_synchronous_with_no_entry() {
        let transport = Arc::new(MockTransport::new());
        let store = store_with(&transport);

        let error = store
            .resolve(&"not-a-url".to_string())
            .await
            .expect_err("invalid url");
        assert!(matches!(error, ConfluxError::Validation(_)));
        assert_eq!(transport.total_calls(), 0);
        // No cache entry was created for the invalid argument.
        assert_eq!(
            store.status(&"not-a-url".to_string()).expect("status"),
            ResolutionStatus::NotStarted
        );
    }

    #[tokio::test]
    async fn test_transport_error_is_cached_and_not_refetched() {
        let transport = Arc::new(MockTransport::new());
        transport.respond_absolute(
            URL,
            Err(TransportError::http_status(
                500,
                "internal_server_error",
                "Internal Server Error",
            )),
        );
        let store = store_with(&transport);

        let error = store
            .resolve(&URL.to_string())
            .await
            .expect_err("500 surfaces");
        match error {
            ConfluxError::Transport(e) => assert_eq!(e.data.status, Some(500)),
            other => panic!("expected transport error, got {other:?}"),
        }

        // A later resolve observes the same cached error without re-fetching.
        let again = store
            .resolve(&URL.to_string())
            .await
            .expect_err("still errored");
        assert!(matches!(again, ConfluxError::Transport(_)));
        assert_eq!(transport.calls_for_absolute(URL), 1);

        let cached = store
            .error_for(&URL.to_string())
            .expect("selector")
            .expect("error present");
        assert_eq!(cached.data.status, Some(500));
    }

    #[tokio::test]
    async fn test_reset_discards_stale_in_flight_result() {
        let transport = Arc::new(MockTransport::new());
        transport.respond_absolute(URL, Ok(Payload::Text("stale".to_string())));
        transport.respond_absolute(URL, Ok(Payload::Text("fresh".to_string())));
        transport.hold();
        let store = store_with(&transport);

        let in_flight = {
            let store = store.clone();
            tokio::spawn(async move { store.resolve(&URL.to_string()).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Reset while the first fetch is still held at the transport.
        store.reset(&URL.to_string()).expect("reset");
        transport.release();

        // The raced caller still receives the payload it fetched...
        let stale = in_flight.await.expect("join").expect("resolve");
        assert_eq!(*stale, "stale");

        // ...but the entry was not repopulated by the superseded generation.
        assert_eq!(
            store.status(&URL.to_string()).expect("status"),
            ResolutionStatus::NotStarted
        );

        let fresh = store.resolve(&URL.to_string()).await.expect("resolve");
        assert_eq!(*fresh, "fresh");
        assert_eq!(transport.calls_for_absolute(URL), 2);
    }

    #[tokio::test]
    async fn test_cancelled_owner_releases_key() {
        let transport = Arc::new(MockTransport::new());
        transport.respond_absolute(URL, Ok(Payload::Text("body".to_string())));
        transport.hold();
        let store = store_with(&transport);

        let owner = {
            let store = store.clone();
            tokio::spawn(async move { store.resolve(&URL.to_string()).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(store.is_fetching(&URL.to_string()).expect("fetching"));

        // Drop the owning future mid-call, the way a timeout or a lost
        // select! branch would.
        owner.abort();
        let _ = owner.await;
        assert_eq!(
            store.status(&URL.to_string()).expect("status"),
            ResolutionStatus::NotStarted
        );

        // The key is not wedged: a later resolve re-triggers and completes.
        transport.release();
        let value = tokio::time::timeout(
            Duration::from_millis(500),
            store.resolve(&URL.to_string()),
        )
        .await
        .expect("resolve completes")
        .expect("resolve");
        assert_eq!(*value, "body");
        assert_eq!(transport.calls_for_absolute(URL), 2);
    }

    #[tokio::test]
    async fn test_waiter_takes_over_after_owner_cancellation() {
        let transport = Arc::new(MockTransport::new());
        transport.respond_absolute(URL, Ok(Payload::Text("body".to_string())));
        transport.hold();
        let store = store_with(&transport);

        let owner = {
            let store = store.clone();
            tokio::spawn(async move { store.resolve(&URL.to_string()).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        let waiter = {
            let store = store.clone();
            tokio::spawn(async move { store.resolve(&URL.to_string()).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Aborting the owner wakes the waiter, which re-decides and becomes
        // the new owner of the one in-flight call.
        owner.abort();
        let _ = owner.await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(store.is_fetching(&URL.to_string()).expect("fetching"));

        transport.release();
        let value = waiter.await.expect("join").expect("resolve");
        assert_eq!(*value, "body");
    }

    #[tokio::test]
    async fn test_try_get_never_triggers() {
        let transport = Arc::new(MockTransport::new());
        transport.respond_absolute(URL, Ok(Payload::Text("body".to_string())));
        let store = store_with(&transport);

        assert!(store.try_get(&URL.to_string()).expect("try_get").is_none());
        assert_eq!(transport.total_calls(), 0);

        store.resolve(&URL.to_string()).await.expect("resolve");
        let cached = store
            .try_get(&URL.to_string())
            .expect("try_get")
            .expect("cached");
        assert_eq!(*cached, "body");
        assert_eq!(transport.total_calls(), 1);
    }

    #[tokio::test]
    async fn test_prefetch_resolves_in_background() {
        let transport = Arc::new(MockTransport::new());
        transport.respond_absolute(URL, Ok(Payload::Text("body".to_string())));
        let store = store_with(&transport);

        store.prefetch(URL.to_string()).expect("prefetch");
        store.wait_for(&URL.to_string()).await.expect("wait");

        let cached = store
            .try_get(&URL.to_string())
            .expect("try_get")
            .expect("cached");
        assert_eq!(*cached, "body");
        assert_eq!(transport.calls_for_absolute(URL), 1);
    }

    #[tokio::test]
    async fn test_prefetch_rejects_invalid_args_synchronously() {
        let transport = Arc::new(MockTransport::new());
        let store = store_with(&transport);

        let error = store
            .prefetch("not-a-url".to_string())
            .expect_err("invalid url");
        assert!(matches!(error, ConfluxError::Validation(_)));
        assert_eq!(transport.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_receive_injects_without_network() {
        let transport = Arc::new(MockTransport::new());
        let store = store_with(&transport);

        store
            .receive(&URL.to_string(), "injected".to_string())
            .expect("receive");

        let value = store.resolve(&URL.to_string()).await.expect("resolve");
        assert_eq!(*value, "injected");
        assert_eq!(transport.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_receive_error_injects_terminal_error() {
        let transport = Arc::new(MockTransport::new());
        let store = store_with(&transport);

        store
            .receive_error(
                &URL.to_string(),
                TransportError::http_status(403, "forbidden", "Forbidden"),
            )
            .expect("receive_error");

        let error = store.resolve(&URL.to_string()).await.expect_err("errored");
        assert!(matches!(error, ConfluxError::Transport(_)));
        assert_eq!(transport.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_distinct_keys_fetch_independently() {
        let other = "https://example.org";
        let transport = Arc::new(MockTransport::new());
        transport.respond_absolute(URL, Ok(Payload::Text("com".to_string())));
        transport.respond_absolute(other, Ok(Payload::Text("org".to_string())));
        let store = store_with(&transport);

        let com = store.resolve(&URL.to_string()).await.expect("resolve");
        let org = store.resolve(&other.to_string()).await.expect("resolve");
        assert_eq!(*com, "com");
        assert_eq!(*org, "org");
        assert_eq!(transport.calls_for_absolute(URL), 1);
        assert_eq!(transport.calls_for_absolute(other), 1);
    }

    #[tokio::test]
    async fn test_reset_all_invalidates_every_key() {
        let other = "https://example.org";
        let transport = Arc::new(MockTransport::new());
        transport.respond_absolute(URL, Ok(Payload::Text("com".to_string())));
        transport.respond_absolute(other, Ok(Payload::Text("org".to_string())));
        let store = store_with(&transport);

        store.resolve(&URL.to_string()).await.expect("resolve");
        store.resolve(&other.to_string()).await.expect("resolve");
        store.reset_all().expect("reset_all");

        for url in [URL, other] {
            assert_eq!(
                store.status(&url.to_string()).expect("status"),
                ResolutionStatus::NotStarted
            );
        }
    }
}
