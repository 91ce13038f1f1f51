//! Error type for `soiree-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A rule violation; the transaction it happened in was rolled back.
  #[error("{0}")]
  Core(#[from] soiree_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A column held a value no domain type maps to.
  #[error("cannot decode column: {0}")]
  Decode(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
