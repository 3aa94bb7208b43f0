//! Bearer token verification
//!
//! The managed identity provider issues HMAC-signed bearer tokens.
//! Verification is stateless: the token carries the verified identity
//! and an expiry, signed with a secret shared with the provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Verified identity carried by a bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque user identifier assigned by the identity provider
    pub uid: String,
    /// Email on record with the provider
    pub email: String,
    /// Whether the provider has verified the email
    pub email_verified: bool,
    /// When the token was issued
    pub issued_at: DateTime<Utc>,
    /// When the token expires
    pub expires_at: DateTime<Utc>,
}

impl Identity {
    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

/// Create a signed bearer token
///
/// Token format: base64(payload).base64(hmac_sha256(payload))
///
/// In production the identity provider mints these; this function exists
/// for local development and the test harness.
pub fn create_token(identity: &Identity, secret: &str) -> Result<String, crate::error::AppError> {
    use base64::{Engine as _, engine::general_purpose};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    // 1. Serialize identity to JSON
    let payload =
        serde_json::to_string(identity).map_err(|e| crate::error::AppError::Internal(e.into()))?;

    // 2. Base64 encode the payload
    let payload_b64 = general_purpose::URL_SAFE_NO_PAD.encode(payload.as_bytes());

    // 3. Create HMAC-SHA256 signature
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| crate::error::AppError::Internal(anyhow::anyhow!(e)))?;
    mac.update(payload_b64.as_bytes());
    let signature = mac.finalize().into_bytes();
    let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(signature);

    // 4. Return "{payload}.{signature}"
    Ok(format!("{}.{}", payload_b64, signature_b64))
}

fn invalid_token() -> crate::error::AppError {
    crate::error::AppError::Unauthorized("Invalid authentication token".to_string())
}

/// Verify and decode a bearer token
///
/// # Returns
/// Decoded identity if the signature is valid and the token has not expired
///
/// # Errors
/// Returns 401 errors distinguishing malformed/forged tokens from
/// expired ones, matching what clients need to trigger a refresh.
/// `max_age_seconds` caps token lifetime server-side even when the
/// provider stamped a later `expires_at`.
pub fn verify_token(
    token: &str,
    secret: &str,
    max_age_seconds: i64,
) -> Result<Identity, crate::error::AppError> {
    use base64::{Engine as _, engine::general_purpose};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    // 1. Split token into payload and signature
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 2 {
        return Err(invalid_token());
    }

    let payload_b64 = parts[0];
    let signature_b64 = parts[1];

    // 2. Verify HMAC signature
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| crate::error::AppError::Internal(anyhow::anyhow!(e)))?;
    mac.update(payload_b64.as_bytes());

    let expected_signature = general_purpose::URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| invalid_token())?;

    mac.verify_slice(&expected_signature).map_err(|_| invalid_token())?;

    // 3. Decode and deserialize payload
    let payload_bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| invalid_token())?;

    let payload_str = String::from_utf8(payload_bytes).map_err(|_| invalid_token())?;

    let identity: Identity = serde_json::from_str(&payload_str).map_err(|_| invalid_token())?;

    // 4. Check expiry, both the provider stamp and the local age cap
    let max_age_exceeded =
        Utc::now() > identity.issued_at + chrono::Duration::seconds(max_age_seconds);
    if identity.is_expired() || max_age_exceeded {
        return Err(crate::error::AppError::Unauthorized(
            "Authentication token expired".to_string(),
        ));
    }

    Ok(identity)
}
