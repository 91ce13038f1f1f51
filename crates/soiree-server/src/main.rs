//! Soirée server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) layered under
//! `SOIREE_*` environment variables, opens the SQLite store and the media
//! directory, and serves the JSON API over HTTP.
//!
//! ```toml
//! host             = "0.0.0.0"
//! port             = 8000
//! store_path       = "~/.local/share/soiree/soiree.db"
//! media_dir        = "~/.local/share/soiree/media"
//! min_age          = 18
//! max_upload_bytes = 5242880
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use soiree_api::AppState;
use soiree_server::{FsMediaStore, ServerConfig, expand_tilde};
use soiree_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Soirée party server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the effective configuration and exit.
  #[arg(long)]
  check_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("SOIREE"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  if cli.check_config {
    println!("{server_cfg:#?}");
    return Ok(());
  }

  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent() {
    tokio::fs::create_dir_all(parent)
      .await
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let media_dir = expand_tilde(&server_cfg.media_dir);
  tokio::fs::create_dir_all(&media_dir)
    .await
    .with_context(|| format!("failed to create media directory {media_dir:?}"))?;

  let state = AppState::new(store, FsMediaStore::new(media_dir), server_cfg.policy());
  let app = soiree_server::app(state);
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
