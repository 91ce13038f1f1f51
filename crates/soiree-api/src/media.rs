//! Upload and release helpers shared by the avatar and party image handlers.

use axum::http::{HeaderMap, header};
use bytes::Bytes;
use soiree_core::media::{MediaKind, MediaRef, MediaStore, extension_for};

use crate::{Policy, error::ApiError};

/// Validate an upload against `policy` and persist it.
pub async fn store_upload<M: MediaStore>(
  media: &M,
  policy: &Policy,
  kind: MediaKind,
  headers: &HeaderMap,
  body: Bytes,
) -> Result<MediaRef, ApiError> {
  if body.is_empty() {
    return Err(ApiError::BadRequest("upload body is empty".into()));
  }
  if body.len() > policy.max_upload_bytes {
    return Err(ApiError::PayloadTooLarge(format!(
      "uploads are limited to {} bytes",
      policy.max_upload_bytes
    )));
  }

  let content_type = headers
    .get(header::CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .unwrap_or_default();
  let extension = extension_for(content_type)
    .ok_or_else(|| ApiError::UnsupportedMediaType(format!("{content_type:?} is not an image")))?;

  let stored = media
    .save(kind, extension, body.to_vec())
    .await
    .map_err(ApiError::media)?;
  tracing::debug!(reference = %stored.reference, hash = %stored.content_hash, "stored upload");
  Ok(stored.reference)
}

/// Best-effort removal of media no row refers to anymore. Failures are
/// logged and otherwise ignored.
pub async fn release<M: MediaStore>(media: &M, references: impl IntoIterator<Item = MediaRef>) {
  for reference in references {
    if reference.is_default() {
      continue;
    }
    if let Err(e) = media.delete(&reference).await {
      tracing::warn!(%reference, error = %e, "failed to release media");
    }
  }
}
