//! Media references and the [`MediaStore`] abstraction.
//!
//! No binary data lives in the database; users and parties only carry a
//! relative path into the media directory.

use std::{fmt, future::Future};

use serde::{Deserialize, Serialize};

/// Path of a stored file, relative to the configured media directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaRef(String);

impl MediaRef {
  pub fn new(path: impl Into<String>) -> Self { Self(path.into()) }

  pub fn as_str(&self) -> &str { &self.0 }

  /// Defaults are shared by every entity and must never be deleted.
  pub fn is_default(&self) -> bool { self.0.starts_with("defaults/") }
}

impl fmt::Display for MediaRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Which entity an upload belongs to; picks the sub-directory and default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
  Avatar,
  PartyImage,
}

impl MediaKind {
  pub fn dir(self) -> &'static str {
    match self {
      Self::Avatar => "pfp",
      Self::PartyImage => "parties",
    }
  }

  pub fn default_reference(self) -> MediaRef {
    match self {
      Self::Avatar => MediaRef::new("defaults/pfps/default.png"),
      Self::PartyImage => MediaRef::new("defaults/parties/default.png"),
    }
  }
}

/// Map an upload's `Content-Type` to the file extension it is stored under.
pub fn extension_for(content_type: &str) -> Option<&'static str> {
  let essence = content_type.split(';').next().unwrap_or_default().trim();
  match essence.to_ascii_lowercase().as_str() {
    "image/png" => Some("png"),
    "image/jpeg" | "image/jpg" => Some("jpg"),
    "image/gif" => Some("gif"),
    "image/webp" => Some("webp"),
    _ => None,
  }
}

/// Result of a successful upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMedia {
  pub reference:    MediaRef,
  /// SHA-256 hex digest of the stored bytes.
  pub content_hash: String,
}

/// Storage for uploaded images, keyed by a generated unique filename.
///
/// Deletion is best-effort cleanup: callers log failures and carry on, it is
/// never part of a store transaction.
pub trait MediaStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist `bytes` under `<kind dir>/<uuid>.<extension>`.
  fn save(
    &self,
    kind: MediaKind,
    extension: &str,
    bytes: Vec<u8>,
  ) -> impl Future<Output = Result<StoredMedia, Self::Error>> + Send;

  /// Remove a previously stored file. Defaults are left alone.
  fn delete(
    &self,
    reference: &MediaRef,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn content_type_to_extension() {
    assert_eq!(extension_for("image/png"), Some("png"));
    assert_eq!(extension_for("IMAGE/JPEG; charset=binary"), Some("jpg"));
    assert_eq!(extension_for("text/plain"), None);
  }

  #[test]
  fn defaults_are_recognised() {
    assert!(MediaKind::Avatar.default_reference().is_default());
    assert!(!MediaRef::new("pfp/1234.png").is_default());
  }
}
