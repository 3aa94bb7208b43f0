//! Auth and profile endpoints
//!
//! The identity provider handles credentials; these routes manage the
//! profile document attached to a verified identity.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{delete, get, post, put},
};
use serde::{Deserialize, Deserializer};

use super::{message_only, success, success_with_message};
use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::service::{NewProfile, ProfilePatch, ProfileService};

const MIN_DISPLAY_NAME_CHARS: usize = 2;
const MAX_DISPLAY_NAME_CHARS: usize = 30;
const MAX_BIO_CHARS: usize = 150;

/// Distinguishes an absent field from an explicit null, so a PUT can
/// clear optional profile fields.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub profile_pic_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub bio: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub profile_pic_url: Option<Option<String>>,
}

fn validate_display_name(display_name: &str, errors: &mut Vec<String>) {
    let chars = display_name.chars().count();
    if !(MIN_DISPLAY_NAME_CHARS..=MAX_DISPLAY_NAME_CHARS).contains(&chars) {
        errors.push(format!(
            "displayName must be between {} and {} characters",
            MIN_DISPLAY_NAME_CHARS, MAX_DISPLAY_NAME_CHARS
        ));
    }
    if !display_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == ' ' || c == '-' || c == '_')
    {
        errors.push(
            "displayName can only contain letters, numbers, spaces, hyphens, and underscores"
                .to_string(),
        );
    }
}

fn validate_bio(bio: &str, errors: &mut Vec<String>) {
    if bio.chars().count() > MAX_BIO_CHARS {
        errors.push(format!("bio must be at most {} characters", MAX_BIO_CHARS));
    }
}

fn validate_profile_pic_url(profile_pic_url: &str, errors: &mut Vec<String>) {
    if url::Url::parse(profile_pic_url).is_err() {
        errors.push("profilePicUrl must be a valid URL".to_string());
    }
}

fn collect(errors: Vec<String>) -> Result<(), AppError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::ValidationDetails(errors))
    }
}

fn build_profile_service(state: &AppState) -> ProfileService {
    ProfileService::new(state.store.clone())
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let display_name = req
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AppError::Validation("displayName is required".to_string()))?;

    let mut errors = Vec::new();
    validate_display_name(display_name, &mut errors);
    if let Some(bio) = req.bio.as_deref() {
        validate_bio(bio, &mut errors);
    }
    if let Some(profile_pic_url) = req.profile_pic_url.as_deref() {
        validate_profile_pic_url(profile_pic_url, &mut errors);
    }
    collect(errors)?;

    let profile = build_profile_service(&state)
        .register(
            &identity,
            NewProfile {
                display_name: display_name.to_string(),
                bio: req.bio,
                profile_pic_url: req.profile_pic_url,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        success_with_message("User registered successfully", profile),
    ))
}

/// GET /api/auth/profile
pub async fn get_profile(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let profile = build_profile_service(&state).get(&identity.uid).await?;
    Ok(success(profile))
}

/// PUT /api/auth/profile
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut errors = Vec::new();
    let display_name = req.display_name.as_deref().map(str::trim);
    if let Some(display_name) = display_name {
        validate_display_name(display_name, &mut errors);
    }
    if let Some(Some(bio)) = &req.bio {
        validate_bio(bio, &mut errors);
    }
    if let Some(Some(profile_pic_url)) = &req.profile_pic_url {
        validate_profile_pic_url(profile_pic_url, &mut errors);
    }
    collect(errors)?;

    let profile = build_profile_service(&state)
        .update(
            &identity.uid,
            ProfilePatch {
                display_name: display_name.map(str::to_string),
                bio: req.bio,
                profile_pic_url: req.profile_pic_url,
            },
        )
        .await?;

    Ok(success_with_message("Profile updated successfully", profile))
}

/// DELETE /api/auth/account
pub async fn delete_account(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    build_profile_service(&state).delete(&identity.uid).await?;
    Ok(message_only("Account deleted successfully"))
}

/// Create auth router
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/profile", get(get_profile))
        .route("/profile", put(update_profile))
        .route("/account", delete(delete_account))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_charset_and_length() {
        let mut errors = Vec::new();
        validate_display_name("Alice B-2_ok", &mut errors);
        assert!(errors.is_empty());

        let mut errors = Vec::new();
        validate_display_name("A", &mut errors);
        assert_eq!(errors.len(), 1);

        let mut errors = Vec::new();
        validate_display_name(&"x".repeat(31), &mut errors);
        assert_eq!(errors.len(), 1);

        let mut errors = Vec::new();
        validate_display_name("bad!name", &mut errors);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn bio_length_cap() {
        let mut errors = Vec::new();
        validate_bio(&"b".repeat(150), &mut errors);
        assert!(errors.is_empty());
        validate_bio(&"b".repeat(151), &mut errors);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn profile_pic_url_must_parse() {
        let mut errors = Vec::new();
        validate_profile_pic_url("https://cdn.example.com/me.jpg", &mut errors);
        assert!(errors.is_empty());
        validate_profile_pic_url("not a url", &mut errors);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn update_request_distinguishes_absent_from_null() {
        let absent: UpdateProfileRequest = serde_json::from_str("{}").unwrap();
        assert!(absent.bio.is_none());

        let cleared: UpdateProfileRequest = serde_json::from_str(r#"{"bio": null}"#).unwrap();
        assert_eq!(cleared.bio, Some(None));

        let set: UpdateProfileRequest = serde_json::from_str(r#"{"bio": "hi"}"#).unwrap();
        assert_eq!(set.bio, Some(Some("hi".to_string())));
    }
}
