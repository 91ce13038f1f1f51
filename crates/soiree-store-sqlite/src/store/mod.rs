//! [`SqliteStore`], the SQLite implementation of the Soirée store traits.

use std::path::Path;

use rusqlite::{Connection, Transaction};

use crate::{Result, schema::SCHEMA};

mod identity;
mod party;
mod relationship;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Soirée store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` against the connection outside any explicit transaction.
  async fn read<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(conn))).await?
  }

  /// Run `f` inside one transaction. The transaction commits only when `f`
  /// returns `Ok`; any error, rule violations included, rolls it back.
  async fn write<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&Transaction<'_>) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        Ok(f(&tx).and_then(|value| {
          tx.commit()?;
          Ok(value)
        }))
      })
      .await?
  }
}

/// `LIKE` pattern matching `text` anywhere, with wildcards in `text` escaped.
/// Pair with `ESCAPE '\'`.
fn contains_pattern(text: &str) -> String {
  let escaped = text.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
  format!("%{escaped}%")
}

/// SQLite treats a negative `LIMIT` as unbounded.
fn sql_limit(limit: Option<usize>) -> i64 { limit.map_or(-1, |l| l as i64) }

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn like_wildcards_are_escaped() {
    assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
    assert_eq!(contains_pattern(""), "%%");
  }
}
