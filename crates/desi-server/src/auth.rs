//! Admin-key extractor and standalone verifier.
//!
//! The admin secret is configured as an argon2 PHC string and supplied by
//! clients in the `x-admin-key` header. With no secret configured every
//! admin request is rejected.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use desi_core::KbStore;

use crate::{AppState, error::ApiError};

pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// The configured admin secret, if any.
#[derive(Clone, Default)]
pub struct AdminAuth {
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub key_hash: Option<String>,
}

impl AdminAuth {
  pub fn new(key_hash: Option<String>) -> Self {
    Self {
      key_hash: key_hash.filter(|h| !h.trim().is_empty()),
    }
  }

  pub fn is_configured(&self) -> bool {
    self.key_hash.is_some()
  }
}

/// Zero-size marker: present in the handler means the request carried the
/// admin key.
pub struct Admin;

/// Check the `x-admin-key` header against the configured hash.
pub fn verify_admin(headers: &HeaderMap, auth: &AdminAuth) -> Result<(), ApiError> {
  let hash = auth.key_hash.as_deref().ok_or(ApiError::Unauthorized)?;

  let supplied = headers
    .get(ADMIN_KEY_HEADER)
    .and_then(|v| v.to_str().ok())
    .filter(|v| !v.is_empty())
    .ok_or(ApiError::Unauthorized)?;

  let parsed_hash = PasswordHash::new(hash).map_err(|_| ApiError::Unauthorized)?;

  Argon2::default()
    .verify_password(supplied.as_bytes(), &parsed_hash)
    .map_err(|_| ApiError::Unauthorized)?;

  Ok(())
}

impl<S> FromRequestParts<AppState<S>> for Admin
where
  S: KbStore + Clone + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    if let Err(e) = verify_admin(&parts.headers, &state.auth) {
      tracing::warn!(
        configured = state.auth.is_configured(),
        path = %parts.uri.path(),
        "rejected admin request"
      );
      return Err(e);
    }
    Ok(Admin)
  }
}
