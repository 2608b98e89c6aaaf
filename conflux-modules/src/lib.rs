//! CONFLUX Modules - Domain Stores
//!
//! Concrete resolution stores built on the engine: site HTML inspection and
//! analytics properties/profiles, composed by an explicit [`Registry`]
//! constructed once at startup. Cross-store reads are explicit method calls
//! on injected references - there is no global lookup by name.

pub mod analytics;
pub mod registry;
pub mod site;

pub use analytics::AnalyticsStore;
pub use registry::Registry;
pub use site::SiteStore;
