//! ID formats and selection sentinels.
//!
//! Account IDs are non-empty digit strings; UA property IDs have the form
//! `UA-{accountID}-{index}`. Selection validators additionally accept the
//! create sentinels, which stand for "set up a new one" in selection flows.

use once_cell::sync::Lazy;
use regex::Regex;

/// Sentinel selection value: create a new property.
pub const PROPERTY_CREATE: &str = "property_create";

/// Sentinel selection value: create a new profile.
pub const PROFILE_CREATE: &str = "profile_create";

static ACCOUNT_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+$").expect("account ID pattern is valid"));

static PROPERTY_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^UA-(\d+)-(\d+)$").expect("property ID pattern is valid"));

pub fn is_valid_account_id(account_id: &str) -> bool {
    ACCOUNT_ID_RE.is_match(account_id)
}

pub fn is_valid_property_id(property_id: &str) -> bool {
    PROPERTY_ID_RE.is_match(property_id)
}

/// Profiles are identified by plain numeric IDs.
pub fn is_valid_profile_id(profile_id: &str) -> bool {
    ACCOUNT_ID_RE.is_match(profile_id)
}

/// A property selection is a valid property ID or the create sentinel.
pub fn is_valid_property_selection(selection: &str) -> bool {
    selection == PROPERTY_CREATE || is_valid_property_id(selection)
}

/// A profile selection is a valid profile ID or the create sentinel.
pub fn is_valid_profile_selection(selection: &str) -> bool {
    selection == PROFILE_CREATE || is_valid_profile_id(selection)
}

/// Recover the account ID embedded in a UA property ID.
pub fn parse_property_id(property_id: &str) -> Option<String> {
    PROPERTY_ID_RE
        .captures(property_id)
        .map(|captures| captures[1].to_string())
}

// =============================================================================
// TESTS
// =============================================================================
