//! The composition root.
//!
//! One registry is constructed at application start from one transport and
//! passed by reference to whatever needs to read from the stores. Stores are
//! plain fields, not a name-keyed lookup: a consumer that needs a store
//! takes it as an explicit dependency.

use std::sync::Arc;

use conflux_core::Transport;

use crate::analytics::AnalyticsStore;
use crate::site::SiteStore;

/// All domain stores, one instance each, sharing one transport.
#[derive(Debug)]
pub struct Registry {
    pub site: SiteStore,
    pub analytics: AnalyticsStore,
}

impl Registry {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            site: SiteStore::new(Arc::clone(&transport)),
            analytics: AnalyticsStore::new(transport),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
