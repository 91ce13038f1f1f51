//! Filesystem-backed [`MediaStore`].
//!
//! Files live under `<media_dir>/<kind dir>/<uuid>.<ext>`; the reference
//! handed back to callers is the path relative to `media_dir`.

use std::path::{Component, Path, PathBuf};

use sha2::{Digest, Sha256};
use soiree_core::media::{MediaKind, MediaRef, MediaStore, StoredMedia};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum MediaError {
  #[error("media I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("invalid media reference: {0}")]
  InvalidReference(String),
}

#[derive(Debug, Clone)]
pub struct FsMediaStore {
  root: PathBuf,
}

impl FsMediaStore {
  pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

  /// Resolve `reference` below the root, refusing anything that could escape
  /// it.
  fn path_of(&self, reference: &MediaRef) -> Result<PathBuf, MediaError> {
    let relative = Path::new(reference.as_str());
    if relative
      .components()
      .any(|c| !matches!(c, Component::Normal(_)))
    {
      return Err(MediaError::InvalidReference(reference.to_string()));
    }
    Ok(self.root.join(relative))
  }
}

impl MediaStore for FsMediaStore {
  type Error = MediaError;

  async fn save(
    &self,
    kind: MediaKind,
    extension: &str,
    bytes: Vec<u8>,
  ) -> Result<StoredMedia, MediaError> {
    let reference = MediaRef::new(format!("{}/{}.{extension}", kind.dir(), Uuid::new_v4()));
    let path = self.path_of(&reference)?;
    if let Some(parent) = path.parent() {
      tokio::fs::create_dir_all(parent).await?;
    }

    let content_hash = hex::encode(Sha256::digest(&bytes));
    tokio::fs::write(&path, bytes).await?;
    tracing::debug!(path = %path.display(), "wrote media file");
    Ok(StoredMedia { reference, content_hash })
  }

  async fn delete(&self, reference: &MediaRef) -> Result<(), MediaError> {
    if reference.is_default() {
      return Ok(());
    }
    let path = self.path_of(reference)?;
    match tokio::fs::remove_file(&path).await {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
      Err(e) => Err(e.into()),
    }
  }
}
