//! The analytics store: resolution stores for properties and profiles, the
//! create-property mutation, and the selection flow that ties them together.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use conflux_core::{
    ConfluxError, ConfluxResult, StoreError, Transport, TransportError, ValidationError,
};
use conflux_store::{MutationStore, ResolutionStore};
use tracing::debug;

use super::ops::{CreateProperty, GetProfiles, GetPropertiesProfiles};
use super::types::{PropertiesProfiles, Profile, Property};
use super::util::{
    is_valid_account_id, is_valid_property_selection, parse_property_id, PROFILE_CREATE,
    PROPERTY_CREATE,
};

/// Selection state: which account/property/profile the user has picked, the
/// property the service matched to the site, and which accounts are still
/// between fetch commit and post-fetch bookkeeping.
#[derive(Debug, Default)]
struct Selection {
    account_id: Option<String>,
    property_id: Option<String>,
    internal_web_property_id: Option<String>,
    profile_id: Option<String>,
    matched_property: Option<Property>,
    // A count, not a set: concurrent calls for one account each hold a
    // slot, and the flag clears only when the last one finishes.
    awaiting_completion: HashMap<String, usize>,
}

/// Releases one `awaiting_completion` slot when the holding call ends,
/// whether it finished its bookkeeping or its future was dropped mid-fetch.
struct CompletionGuard<'a> {
    store: &'a AnalyticsStore,
    account: String,
}

impl Drop for CompletionGuard<'_> {
    fn drop(&mut self) {
        let _ = self.store.with_selection(|s| {
            if let Some(count) = s.awaiting_completion.get_mut(&self.account) {
                *count -= 1;
                if *count == 0 {
                    s.awaiting_completion.remove(&self.account);
                }
            }
        });
    }
}

/// Domain store for the analytics module.
pub struct AnalyticsStore {
    properties: ResolutionStore<GetPropertiesProfiles>,
    profiles: ResolutionStore<GetProfiles>,
    create_property: MutationStore<CreateProperty>,
    selection: Mutex<Selection>,
}

impl AnalyticsStore {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            properties: ResolutionStore::new(Arc::new(GetPropertiesProfiles), Arc::clone(&transport)),
            profiles: ResolutionStore::new(Arc::new(GetProfiles), Arc::clone(&transport)),
            create_property: MutationStore::new(Arc::new(CreateProperty), transport),
            selection: Mutex::new(Selection::default()),
        }
    }

    fn with_selection<R>(&self, f: impl FnOnce(&mut Selection) -> R) -> ConfluxResult<R> {
        let mut selection = self
            .selection
            .lock()
            .map_err(|_| ConfluxError::Store(StoreError::LockPoisoned))?;
        Ok(f(&mut selection))
    }

    // ------------------------------------------------------------------
    // Selection accessors
    // ------------------------------------------------------------------

    pub fn set_account_id(&self, account_id: &str) -> ConfluxResult<()> {
        if !is_valid_account_id(account_id) {
            return Err(ValidationError::InvalidValue {
                field: "accountID".to_string(),
                reason: "must be a numeric account ID".to_string(),
            }
            .into());
        }
        self.with_selection(|s| s.account_id = Some(account_id.to_string()))
    }

    pub fn account_id(&self) -> ConfluxResult<Option<String>> {
        self.with_selection(|s| s.account_id.clone())
    }

    pub fn selected_property_id(&self) -> ConfluxResult<Option<String>> {
        self.with_selection(|s| s.property_id.clone())
    }

    pub fn selected_profile_id(&self) -> ConfluxResult<Option<String>> {
        self.with_selection(|s| s.profile_id.clone())
    }

    pub fn internal_web_property_id(&self) -> ConfluxResult<Option<String>> {
        self.with_selection(|s| s.internal_web_property_id.clone())
    }

    /// The property the service matched to the current site, if the last
    /// properties fetch reported one.
    pub fn matched_property(&self) -> ConfluxResult<Option<Property>> {
        self.with_selection(|s| s.matched_property.clone())
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Properties and profiles for an account, fetched once and cached.
    ///
    /// On a fresh resolution this also runs the post-fetch bookkeeping
    /// (recording the matched property); `is_doing_get_properties` stays
    /// true until that bookkeeping is finished, not just until the fetch
    /// commits.
    pub async fn properties(&self, account_id: &str) -> ConfluxResult<Arc<PropertiesProfiles>> {
        if !is_valid_account_id(account_id) {
            return Err(ValidationError::InvalidValue {
                field: "accountID".to_string(),
                reason: "must be a numeric account ID".to_string(),
            }
            .into());
        }
        let account = account_id.to_string();

        // Terminal entries come straight from the cache; bookkeeping already
        // ran when they were first resolved.
        if self.properties.has_finished(&account)? {
            return self.properties.resolve(&account).await;
        }

        self.with_selection(|s| {
            *s.awaiting_completion.entry(account.clone()).or_insert(0) += 1;
        })?;
        let _completion = CompletionGuard {
            store: self,
            account: account.clone(),
        };

        let result = self.properties.resolve(&account).await;

        if let Ok(body) = &result {
            if let Some(matched) = &body.matched_property {
                debug!(property = %matched.id, "recording matched property");
                self.with_selection(|s| s.matched_property = Some(matched.clone()))?;
            }
        }

        result
    }

    /// Profiles of one property, keyed by (account ID, property ID).
    pub async fn profiles(
        &self,
        account_id: &str,
        property_id: &str,
    ) -> ConfluxResult<Arc<Vec<Profile>>> {
        self.profiles
            .resolve(&(account_id.to_string(), property_id.to_string()))
            .await
    }

    /// Look up a cached property by its ID.
    ///
    /// The account is recovered from the property ID itself; only already
    /// resolved properties are consulted, no fetch is triggered.
    pub fn property_by_id(&self, property_id: &str) -> ConfluxResult<Option<Property>> {
        let account = match parse_property_id(property_id) {
            Some(account) => account,
            None => return Ok(None),
        };
        let cached = match self.properties.try_get(&account) {
            Ok(cached) => cached,
            Err(ConfluxError::Transport(_)) => None,
            Err(other) => return Err(other),
        };
        Ok(cached.and_then(|body| {
            body.properties
                .iter()
                .find(|property| property.id == property_id)
                .cloned()
        }))
    }

    // ------------------------------------------------------------------
    // Writes & selection flow
    // ------------------------------------------------------------------

    /// Create a new property under an account.
    ///
    /// On success the created property is appended to the cached properties
    /// for that account through the store's sanctioned injection path, so
    /// subsequent reads see it without a refetch.
    pub async fn create_property(&self, account_id: &str) -> ConfluxResult<Property> {
        let account = account_id.to_string();
        let property = self.create_property.dispatch(&account).await?;

        let mut updated = match self.properties.try_get(&account) {
            Ok(Some(existing)) => (*existing).clone(),
            Ok(None) => PropertiesProfiles::default(),
            Err(ConfluxError::Transport(_)) => PropertiesProfiles::default(),
            Err(other) => return Err(other),
        };
        updated.properties.push(property.clone());
        self.properties.receive(&account, updated)?;

        Ok(property)
    }

    /// Select a property and settle the matching profile selection.
    ///
    /// Precedence for the profile, ported from the original flow: keep an
    /// existing selection that belongs to the property, else the property's
    /// default profile, else the first profile, else the create sentinel.
    /// A missing or invalid account selection makes this a no-op.
    pub async fn select_property(&self, property_id: &str) -> ConfluxResult<()> {
        if !is_valid_property_selection(property_id) {
            return Err(ValidationError::InvalidValue {
                field: "propertyID".to_string(),
                reason: "must be a valid property ID or the create sentinel".to_string(),
            }
            .into());
        }

        let account = match self.account_id()? {
            Some(account) if is_valid_account_id(&account) => account,
            _ => return Ok(()),
        };

        self.with_selection(|s| s.property_id = Some(property_id.to_string()))?;

        if property_id == PROPERTY_CREATE {
            self.with_selection(|s| s.profile_id = Some(PROFILE_CREATE.to_string()))?;
            return Ok(());
        }

        self.properties.wait_for(&account).await?;
        let property = self.property_by_id(property_id)?;

        let internal = property
            .as_ref()
            .map(|p| p.internal_web_property_id.clone())
            .unwrap_or_default();
        self.with_selection(|s| s.internal_web_property_id = Some(internal))?;

        let existing_profile = self.selected_profile_id()?;

        let profiles = match self.profiles(&account, property_id).await {
            Ok(profiles) => profiles,
            // Leave the current profile selection alone rather than
            // clobbering it on a failed fetch.
            Err(ConfluxError::Transport(_)) => return Ok(()),
            Err(other) => return Err(other),
        };

        if let Some(existing) = &existing_profile {
            if profiles.iter().any(|profile| &profile.id == existing) {
                return Ok(());
            }
        }

        if let Some(property) = &property {
            let default_id = &property.default_profile_id;
            if !default_id.is_empty() && profiles.iter().any(|profile| &profile.id == default_id) {
                self.with_selection(|s| s.profile_id = Some(default_id.clone()))?;
                return Ok(());
            }
        }

        let next = profiles
            .first()
            .map(|profile| profile.id.clone())
            .unwrap_or_else(|| PROFILE_CREATE.to_string());
        self.with_selection(|s| s.profile_id = Some(next))?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Status & error selectors
    // ------------------------------------------------------------------

    /// True while the properties fetch is in flight *or* its post-fetch
    /// bookkeeping has not finished.
    pub fn is_doing_get_properties(&self, account_id: &str) -> ConfluxResult<bool> {
        let account = account_id.to_string();
        if self.properties.is_fetching(&account)? {
            return Ok(true);
        }
        self.with_selection(|s| s.awaiting_completion.get(&account).copied().unwrap_or(0) > 0)
    }

    pub fn is_doing_create_property(&self, account_id: &str) -> ConfluxResult<bool> {
        self.create_property.is_doing(&account_id.to_string())
    }

    pub fn error_for_properties(&self, account_id: &str) -> ConfluxResult<Option<TransportError>> {
        self.properties.error_for(&account_id.to_string())
    }

    pub fn error_for_profiles(
        &self,
        account_id: &str,
        property_id: &str,
    ) -> ConfluxResult<Option<TransportError>> {
        self.profiles
            .error_for(&(account_id.to_string(), property_id.to_string()))
    }

    pub fn error_for_create_property(
        &self,
        account_id: &str,
    ) -> ConfluxResult<Option<TransportError>> {
        self.create_property.error_for(&account_id.to_string())
    }

    /// Invalidate the cached properties for an account. The manual-retry
    /// path: reset, then resolve afresh.
    pub fn reset_properties(&self, account_id: &str) -> ConfluxResult<()> {
        self.properties.reset(&account_id.to_string())
    }
}

impl std::fmt::Debug for AnalyticsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyticsStore").finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
