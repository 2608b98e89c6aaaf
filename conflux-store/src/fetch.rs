//! The fetch operation contract.

use conflux_core::{
    ArgValue, EncodingError, Payload, TransportError, TransportRequest, ValidationError,
};

/// One cacheable read against the transport.
///
/// A domain store implements this once per datapoint it reads. The
/// resolution coordinator owns the lifecycle: it validates, derives the key,
/// decides whether a call is needed, and commits the decoded result. An
/// implementation is never invoked twice for a key already in flight.
///
/// Order of operations per resolve: `validate` (synchronous, before any
/// state mutation), `key_args` + key encoding, then - only when the
/// coordinator decides a call is needed - `request`, the transport,
/// `decode`, and `reduce` at commit time.
pub trait FetchOperation: Send + Sync + 'static {
    /// The argument tuple callers pass.
    type Args: Clone + Send + Sync + 'static;

    /// The normalized payload cached per key.
    type Output: Send + Sync + 'static;

    /// Operation name for log lines and error context.
    fn name(&self) -> &'static str;

    /// Check argument preconditions.
    ///
    /// Runs synchronously before key encoding and any state mutation; an
    /// invalid argument means zero network calls and no cache entry for the
    /// would-be key.
    fn validate(&self, args: &Self::Args) -> Result<(), ValidationError>;

    /// The values the resolution key is derived from.
    fn key_args(&self, args: &Self::Args) -> Result<Vec<ArgValue>, EncodingError>;

    /// Describe the external call for these arguments.
    fn request(&self, args: &Self::Args) -> TransportRequest;

    /// Normalize the raw payload into the cached output type.
    fn decode(&self, payload: Payload) -> Result<Self::Output, TransportError>;

    /// Fold an incoming payload into the key's state.
    ///
    /// The only sanctioned mutation path: both network commits and direct
    /// `receive` injections flow through here. The default replaces whatever
    /// was cached; stores with append semantics override it.
    fn reduce(
        &self,
        previous: Option<&Self::Output>,
        incoming: Self::Output,
        args: &Self::Args,
    ) -> Self::Output {
        let _ = (previous, args);
        incoming
    }
}
