//! Authentication extractors
//!
//! Routes declare their auth requirement by taking either `CurrentUser`
//! (required, 401 on failure) or `MaybeUser` (optional, silently
//! anonymous on absent or invalid tokens).

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, request::Parts},
};

use super::token::{Identity, verify_token};
use crate::AppState;
use crate::error::AppError;

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(ToOwned::to_owned)
}

fn missing_token() -> AppError {
    AppError::Unauthorized("No authentication token provided".to_string())
}

/// Extractor for the current authenticated identity
///
/// # Usage
/// ```ignore
/// async fn handler(
///     CurrentUser(identity): CurrentUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}", identity.uid)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<Identity>().cloned() {
            return Ok(CurrentUser(identity));
        }

        let state = AppState::from_ref(state);
        let token = extract_bearer_token(&parts.headers).ok_or_else(missing_token)?;
        let identity = verify_token(
            &token,
            &state.config.auth.token_secret,
            state.config.auth.token_max_age,
        )?;
        parts.extensions.insert(identity.clone());

        Ok(CurrentUser(identity))
    }
}

/// Optional identity extractor
///
/// Returns None if not authenticated, instead of an error. A present but
/// invalid token is treated the same as no token at all.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<Identity>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<Identity>().cloned() {
            return Ok(MaybeUser(Some(identity)));
        }

        let app_state = AppState::from_ref(state);
        let identity = extract_bearer_token(&parts.headers).and_then(|token| {
            verify_token(
                &token,
                &app_state.config.auth.token_secret,
                app_state.config.auth.token_max_age,
            )
            .ok()
        });

        if let Some(identity) = &identity {
            parts.extensions.insert(identity.clone());
        }

        Ok(MaybeUser(identity))
    }
}
