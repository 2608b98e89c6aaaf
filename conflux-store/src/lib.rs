//! CONFLUX Store - Keyed Async Resolution Engine
//!
//! Given a typed fetch operation and a key derived from its arguments, a
//! [`ResolutionStore`] guarantees at most one in-flight network operation per
//! key, caches the terminal result (value or structured error), and lets any
//! number of independent callers await or read that result without
//! re-triggering the operation.
//!
//! # Design
//!
//! The engine is split the way its responsibilities divide:
//!
//! - [`entry`]: per-key cache records and the generation counter that guards
//!   against stale in-flight results repopulating a reset entry.
//! - [`state`]: the container owning all records for one store, plus the
//!   revision channel waiters observe.
//! - [`fetch`]: the [`FetchOperation`] contract a domain store implements to
//!   describe one cacheable read.
//! - [`resolver`]: the coordinator deciding, per key, whether to trigger a
//!   fetch, await an in-flight one, or return the cached result.
//! - [`mutation`]: the same machinery minus caching, for writes.

pub mod entry;
pub mod fetch;
pub mod mutation;
pub mod resolver;
pub mod state;

pub use entry::{CacheEntry, Generation};
pub use fetch::FetchOperation;
pub use mutation::{MutationOperation, MutationStore};
pub use resolver::ResolutionStore;
pub use state::{RevisionChannel, StateContainer};
