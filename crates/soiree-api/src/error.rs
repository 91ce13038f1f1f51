//! API error type and [`axum::response::IntoResponse`] implementation.

use std::error::Error as StdError;

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("payload too large: {0}")]
  PayloadTooLarge(String),

  #[error("unsupported media type: {0}")]
  UnsupportedMediaType(String),

  #[error("internal error: {0}")]
  Internal(String),

  /// A rule violation reported by the engine, mapped 1:1 to a status.
  #[error(transparent)]
  Rule(#[from] soiree_core::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn StdError + Send + Sync>),

  #[error("media error: {0}")]
  Media(#[source] Box<dyn StdError + Send + Sync>),
}

/// The first [`soiree_core::Error`] in `err`'s source chain, itself included.
fn find_rule<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a soiree_core::Error> {
  let mut current = Some(err);
  while let Some(e) = current {
    if let Some(rule) = e.downcast_ref::<soiree_core::Error>() {
      return Some(rule);
    }
    current = e.source();
  }
  None
}

impl ApiError {
  /// Wrap a store failure. Rule violations anywhere in the chain surface as
  /// [`ApiError::Rule`]; everything else is an internal error.
  pub fn store<E: StdError + Send + Sync + 'static>(err: E) -> Self {
    match find_rule(&err) {
      Some(rule) => Self::Rule(rule.clone()),
      None => Self::Store(Box::new(err)),
    }
  }

  pub fn media<E: StdError + Send + Sync + 'static>(err: E) -> Self { Self::Media(Box::new(err)) }

  pub fn status(&self) -> StatusCode {
    match self {
      Self::Unauthorized => StatusCode::UNAUTHORIZED,
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::BadRequest(_) => StatusCode::BAD_REQUEST,
      Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
      Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
      Self::Rule(rule) if rule.is_not_found() => StatusCode::NOT_FOUND,
      Self::Rule(soiree_core::Error::PermissionDenied(_)) => StatusCode::FORBIDDEN,
      Self::Rule(_) => StatusCode::BAD_REQUEST,
      Self::Internal(_) | Self::Store(_) | Self::Media(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    } else if let Self::Rule(rule) = &self {
      tracing::debug!(%rule, "request rejected");
    }

    let mut res = (status, Json(json!({ "error": self.to_string() }))).into_response();
    if let Self::Unauthorized = self {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"soiree\""),
      );
    }
    res
  }
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;

  #[derive(Debug, Error)]
  #[error("wrapped: {0}")]
  struct Wrapper(#[source] soiree_core::Error);

  #[test]
  fn rule_is_found_through_the_source_chain() {
    let err = ApiError::store(Wrapper(soiree_core::Error::DuplicateInvitation));
    assert!(matches!(err, ApiError::Rule(soiree_core::Error::DuplicateInvitation)));
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
  }

  #[test]
  fn rule_is_found_directly_and_not_invented() {
    let rule = soiree_core::Error::SelfReference;
    assert!(matches!(find_rule(&rule), Some(soiree_core::Error::SelfReference)));
    assert!(find_rule(&std::io::Error::other("nope")).is_none());
  }

  #[test]
  fn rule_statuses() {
    let id = Uuid::new_v4();
    assert_eq!(ApiError::from(soiree_core::Error::PartyNotFound(id)).status(), StatusCode::NOT_FOUND);
    assert_eq!(
      ApiError::from(soiree_core::Error::PermissionDenied("no")).status(),
      StatusCode::FORBIDDEN
    );
    assert_eq!(ApiError::from(soiree_core::Error::SelfReference).status(), StatusCode::BAD_REQUEST);
  }

  #[test]
  fn unauthorized_challenges_for_basic() {
    let res = ApiError::Unauthorized.into_response();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().contains_key(header::WWW_AUTHENTICATE));
  }

  #[test]
  fn other_failures_are_internal() {
    let err = ApiError::store(std::io::Error::other("disk on fire"));
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let err = ApiError::Internal("hashing failed".into());
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
  }
}
