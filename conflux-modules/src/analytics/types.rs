//! Typed payloads for the analytics datapoints.
//!
//! Field names mirror the wire format, which is camelCase.

use serde::{Deserialize, Serialize};

/// A UA web property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: String,
    pub account_id: String,
    pub name: String,
    #[serde(default)]
    pub internal_web_property_id: String,
    #[serde(default)]
    pub default_profile_id: String,
}

/// A reporting profile (view) belonging to a property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub web_property_id: String,
    pub name: String,
}

/// The properties-profiles datapoint response: the account's properties,
/// the profiles of one of them, and optionally the property the service
/// matched to the current site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertiesProfiles {
    #[serde(default)]
    pub properties: Vec<Property>,
    #[serde(default)]
    pub profiles: Vec<Profile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_property: Option<Property>,
}

// =============================================================================
// TESTS
// =============================================================================
