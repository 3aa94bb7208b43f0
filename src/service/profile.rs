//! User profile service
//!
//! Registration is create-once: the identity provider owns credentials,
//! this service owns the profile document keyed by the provider uid.

use std::sync::Arc;

use chrono::Utc;

use crate::auth::Identity;
use crate::data::{Store, UserProfile};
use crate::error::AppError;

/// Validated input for profile registration
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub display_name: String,
    pub bio: Option<String>,
    pub profile_pic_url: Option<String>,
}

/// Validated partial profile update.
///
/// `bio` and `profile_pic_url` distinguish "leave alone" (`None`) from
/// "clear" (`Some(None)`).
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub display_name: Option<String>,
    pub bio: Option<Option<String>>,
    pub profile_pic_url: Option<Option<String>>,
}

fn profile_not_found() -> AppError {
    AppError::NotFound("User profile not found".to_string())
}

pub struct ProfileService {
    store: Arc<Store>,
}

impl ProfileService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Create the profile document for a verified identity.
    ///
    /// Exactly once per uid; a repeat registration is a 409 and leaves the
    /// existing profile untouched.
    pub async fn register(
        &self,
        identity: &Identity,
        input: NewProfile,
    ) -> Result<UserProfile, AppError> {
        let profile = UserProfile {
            uid: identity.uid.clone(),
            display_name: input.display_name,
            email: identity.email.clone(),
            bio: input.bio,
            profile_pic_url: input.profile_pic_url,
            created_at: Utc::now(),
            strike_count: 0,
            total_uploads: 0,
            impact_score: 0,
            follower_count: 0,
            following_count: 0,
            is_admin: false,
        };

        let created = self.store.insert_user_if_absent(&profile).await?;
        if !created {
            return Err(AppError::Conflict(
                "User profile already exists".to_string(),
            ));
        }

        tracing::info!(uid = %identity.uid, "User profile registered");
        Ok(profile)
    }

    pub async fn get(&self, uid: &str) -> Result<UserProfile, AppError> {
        self.store.get_user(uid).await?.ok_or_else(profile_not_found)
    }

    /// Apply a partial update to the caller's own profile.
    pub async fn update(&self, uid: &str, patch: ProfilePatch) -> Result<UserProfile, AppError> {
        let updated = self
            .store
            .patch_user_profile(
                uid,
                patch.display_name.as_deref(),
                patch.bio.as_ref().map(|b| b.as_deref()),
                patch.profile_pic_url.as_ref().map(|p| p.as_deref()),
            )
            .await?;
        if !updated {
            return Err(profile_not_found());
        }

        self.get(uid).await
    }

    /// Delete the caller's profile document. Irreversible.
    ///
    /// Bearer tokens are stateless, so deletion cannot revoke ones already
    /// issued; they simply age out.
    pub async fn delete(&self, uid: &str) -> Result<(), AppError> {
        let deleted = self.store.delete_user(uid).await?;
        if !deleted {
            return Err(profile_not_found());
        }

        tracing::info!(uid = %uid, "User account deleted");
        Ok(())
    }
}
