//! Soirée HTTP server: configuration, filesystem media and the top-level
//! router.

pub mod media;

use std::path::{Path, PathBuf};

use axum::Router;
use serde::Deserialize;
use soiree_api::{AppState, Policy};
use soiree_core::{media::MediaStore, store::PartyStore, user::DEFAULT_MIN_AGE};
use tower_http::trace::TraceLayer;

pub use media::FsMediaStore;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `SOIREE_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:             String,
  pub port:             u16,
  pub store_path:       PathBuf,
  pub media_dir:        PathBuf,
  pub min_age:          u32,
  pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
  fn default() -> Self {
    let policy = Policy::default();
    Self {
      host:             "127.0.0.1".to_string(),
      port:             8000,
      store_path:       PathBuf::from("~/.local/share/soiree/soiree.db"),
      media_dir:        PathBuf::from("~/.local/share/soiree/media"),
      min_age:          DEFAULT_MIN_AGE,
      max_upload_bytes: policy.max_upload_bytes,
    }
  }
}

impl ServerConfig {
  pub fn policy(&self) -> Policy {
    Policy {
      min_age:          self.min_age,
      max_upload_bytes: self.max_upload_bytes,
    }
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// The API router wrapped in request tracing.
pub fn app<S, M>(state: AppState<S, M>) -> Router
where
  S: PartyStore + 'static,
  M: MediaStore + 'static,
{
  soiree_api::api_router(state).layer(TraceLayer::new_for_http())
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Integration tests ───────────────────────────────────────────────────────
