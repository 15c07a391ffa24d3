//! Account profile and billing settings use-cases.
//!
//! # Invariants
//! - A user without a stored profile reads the default profile.
//! - Stored profiles always validate.

use super::ServiceResult;
use crate::model::account::{BillingSettings, Plan, UserProfile};
use crate::model::UserId;
use crate::repo::document_repo::RepoError;
use crate::store::DocumentStore;
use log::info;

const ACCOUNT_COLLECTION: &str = "account";
const PROFILE_DOC_ID: &str = "profile";

/// Account settings service.
pub struct AccountService<S> {
    store: S,
    user: UserId,
}

impl<S: DocumentStore> AccountService<S> {
    pub fn new(store: S, user: UserId) -> Self {
        Self { store, user }
    }

    /// Returns the stored profile, or defaults for a fresh account.
    pub fn get_profile(&self) -> ServiceResult<UserProfile> {
        load_profile(&self.store, &self.user)
    }

    pub fn save_profile(&self, profile: &UserProfile) -> ServiceResult<()> {
        profile.validate()?;
        let body = serde_json::to_value(profile).map_err(|err| {
            RepoError::InvalidData(format!("cannot encode account profile: {err}"))
        })?;
        self.store
            .set(&self.user, ACCOUNT_COLLECTION, PROFILE_DOC_ID, &body)?;
        info!("event=profile_saved module=account status=ok");
        Ok(())
    }

    /// Replaces billing settings, keeping the rest of the profile.
    pub fn update_billing_settings(&self, billing: BillingSettings) -> ServiceResult<UserProfile> {
        let mut profile = self.get_profile()?;
        profile.billing = billing;
        self.save_profile(&profile)?;
        Ok(profile)
    }

    pub fn change_plan(&self, plan: Plan) -> ServiceResult<UserProfile> {
        let mut profile = self.get_profile()?;
        let previous = profile.plan;
        profile.plan = plan;
        self.save_profile(&profile)?;
        info!("event=plan_changed module=account status=ok from={previous:?} to={plan:?}");
        Ok(profile)
    }
}

/// Reads a user's profile, falling back to defaults.
pub(crate) fn load_profile<S: DocumentStore>(store: &S, user: &UserId) -> ServiceResult<UserProfile> {
    let Some(body) = store.get(user, ACCOUNT_COLLECTION, PROFILE_DOC_ID)? else {
        return Ok(UserProfile::default());
    };
    let profile: UserProfile = serde_json::from_value(body).map_err(|err| {
        RepoError::InvalidData(format!("cannot decode account profile: {err}"))
    })?;
    profile.validate()?;
    Ok(profile)
}
