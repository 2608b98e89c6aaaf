//! Fetch and mutation operations for the analytics datapoints.

use conflux_core::{
    ArgValue, EncodingError, Payload, RequestOptions, TransportError, TransportRequest,
    ValidationError,
};
use conflux_store::{FetchOperation, MutationOperation};
use serde_json::json;

use super::types::{PropertiesProfiles, Profile, Property};
use super::util::{is_valid_account_id, is_valid_property_id};

fn validate_account_id(account_id: &str) -> Result<(), ValidationError> {
    if account_id.is_empty() {
        return Err(ValidationError::MissingField {
            field: "accountID".to_string(),
        });
    }
    if !is_valid_account_id(account_id) {
        return Err(ValidationError::InvalidValue {
            field: "accountID".to_string(),
            reason: "must be a numeric account ID".to_string(),
        });
    }
    Ok(())
}

fn validate_property_id(property_id: &str) -> Result<(), ValidationError> {
    if property_id.is_empty() {
        return Err(ValidationError::MissingField {
            field: "propertyID".to_string(),
        });
    }
    if !is_valid_property_id(property_id) {
        return Err(ValidationError::InvalidValue {
            field: "propertyID".to_string(),
            reason: "must match UA-{accountID}-{index}".to_string(),
        });
    }
    Ok(())
}

/// The account's properties plus the profiles of its first (or matched)
/// property, keyed by account ID. Always bypasses HTTP-level caching; the
/// service-side list changes out from under any cached copy.
pub struct GetPropertiesProfiles;

impl FetchOperation for GetPropertiesProfiles {
    type Args = String;
    type Output = PropertiesProfiles;

    fn name(&self) -> &'static str {
        "getPropertiesProfiles"
    }

    fn validate(&self, args: &String) -> Result<(), ValidationError> {
        validate_account_id(args)
    }

    fn key_args(&self, args: &String) -> Result<Vec<ArgValue>, EncodingError> {
        Ok(vec![json!({ "accountID": args })])
    }

    fn request(&self, args: &String) -> TransportRequest {
        TransportRequest::get("modules", "analytics", "properties-profiles")
            .param("accountID", args.clone())
            .options(RequestOptions { use_cache: false })
    }

    fn decode(&self, payload: Payload) -> Result<PropertiesProfiles, TransportError> {
        serde_json::from_value(payload.into_json()?).map_err(|e| {
            TransportError::invalid_response(format!("undecodable properties-profiles body: {e}"))
        })
    }
}

/// The profiles of one property, keyed by (account ID, property ID).
pub struct GetProfiles;

impl FetchOperation for GetProfiles {
    type Args = (String, String);
    type Output = Vec<Profile>;

    fn name(&self) -> &'static str {
        "getProfiles"
    }

    fn validate(&self, (account_id, property_id): &(String, String)) -> Result<(), ValidationError> {
        validate_account_id(account_id)?;
        validate_property_id(property_id)
    }

    fn key_args(&self, (account_id, property_id): &(String, String)) -> Result<Vec<ArgValue>, EncodingError> {
        Ok(vec![
            json!({ "accountID": account_id }),
            json!({ "propertyID": property_id }),
        ])
    }

    fn request(&self, (account_id, property_id): &(String, String)) -> TransportRequest {
        TransportRequest::get("modules", "analytics", "profiles")
            .param("accountID", account_id.clone())
            .param("propertyID", property_id.clone())
            .options(RequestOptions { use_cache: false })
    }

    fn decode(&self, payload: Payload) -> Result<Vec<Profile>, TransportError> {
        serde_json::from_value(payload.into_json()?).map_err(|e| {
            TransportError::invalid_response(format!("undecodable profiles body: {e}"))
        })
    }
}

/// Create a new property under an account.
pub struct CreateProperty;

impl MutationOperation for CreateProperty {
    type Args = String;
    type Output = Property;

    fn name(&self) -> &'static str {
        "createProperty"
    }

    fn validate(&self, args: &String) -> Result<(), ValidationError> {
        validate_account_id(args)
    }

    fn key_args(&self, args: &String) -> Result<Vec<ArgValue>, EncodingError> {
        Ok(vec![json!({ "accountID": args })])
    }

    fn request(&self, args: &String) -> TransportRequest {
        TransportRequest::post("modules", "analytics", "create-property")
            .param("accountID", args.clone())
    }

    fn decode(&self, payload: Payload) -> Result<Property, TransportError> {
        serde_json::from_value(payload.into_json()?).map_err(|e| {
            TransportError::invalid_response(format!("undecodable create-property body: {e}"))
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
