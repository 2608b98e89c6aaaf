//! Analytics module: properties, profiles, and selection flow.

pub mod ops;
pub mod store;
pub mod types;
pub mod util;

pub use ops::{CreateProperty, GetProfiles, GetPropertiesProfiles};
pub use store::AnalyticsStore;
pub use types::{PropertiesProfiles, Profile, Property};
pub use util::{
    is_valid_account_id, is_valid_profile_id, is_valid_profile_selection, is_valid_property_id,
    is_valid_property_selection, parse_property_id, PROFILE_CREATE, PROPERTY_CREATE,
};
