//! HTTP Basic-auth principal extractor and password hashing.
//!
//! Clients authenticate every request with `Authorization: Basic
//! base64(email:password)`. The password is checked against the argon2 PHC
//! string stored next to the user.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use rand_core::OsRng;
use soiree_core::{media::MediaStore, store::PartyStore, user::User};

use crate::{AppState, error::ApiError};

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct Principal(pub User);

/// Split a Basic `Authorization` header into `(email, password)`.
pub fn basic_credentials(headers: &HeaderMap) -> Result<(String, String), ApiError> {
  let header_val = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded.trim()).map_err(|_| ApiError::Unauthorized)?;
  let creds = String::from_utf8(decoded).map_err(|_| ApiError::Unauthorized)?;

  let (email, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;
  Ok((email.to_owned(), password.to_owned()))
}

/// Check `password` against a stored PHC string.
pub fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc)
    .map(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
    .unwrap_or(false)
}

/// Hash a password into an argon2id PHC string with a fresh salt.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(hashing_failed)
}

fn hashing_failed(e: argon2::password_hash::Error) -> ApiError {
  ApiError::Internal(format!("cannot hash password: {e}"))
}

impl<S, M> FromRequestParts<AppState<S, M>> for Principal
where
  S: PartyStore + 'static,
  M: MediaStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, M>,
  ) -> Result<Self, Self::Rejection> {
    let (email, password) = basic_credentials(&parts.headers)?;

    let creds = state
      .store
      .credentials_by_email(&email)
      .await
      .map_err(ApiError::store)?
      .ok_or(ApiError::Unauthorized)?;

    if !verify_password(&password, &creds.password_hash) {
      tracing::debug!(user_id = %creds.user.user_id, "rejected credentials");
      return Err(ApiError::Unauthorized);
    }
    Ok(Principal(creds.user))
  }
}
