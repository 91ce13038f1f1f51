use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _, params};
use soiree_core::{
  Error as CoreError,
  media::{MediaKind, MediaRef},
  store::IdentityStore,
  user::{Credentials, NewUser, User, UserQuery, UserUpdate, normalize_email},
};
use uuid::Uuid;

use super::{SqliteStore, contains_pattern, sql_limit};
use crate::{
  Error, Result,
  encode::{RawUser, USER_COLUMNS, encode_date, encode_dt, encode_uuid},
  queries,
};

/// Reject `username` if anyone other than `except` holds it.
fn ensure_username_free(conn: &Connection, username: &str, except: Option<Uuid>) -> Result<()> {
  let holder: Option<String> = conn
    .query_row("SELECT user_id FROM users WHERE username = ?1", params![username], |r| {
      r.get(0)
    })
    .optional()?;
  match holder {
    Some(id) if Some(id.as_str()) != except.map(encode_uuid).as_deref() => Err(
      CoreError::validation(format!("a user with username {username:?} already exists")).into(),
    ),
    _ => Ok(()),
  }
}

fn ensure_email_free(conn: &Connection, email: &str) -> Result<()> {
  let taken = conn
    .query_row("SELECT 1 FROM users WHERE email = ?1", params![email], |_| Ok(()))
    .optional()?
    .is_some();
  if taken {
    return Err(CoreError::validation("a user with this email already exists").into());
  }
  Ok(())
}

impl IdentityStore for SqliteStore {
  type Error = Error;

  async fn create_user(&self, input: NewUser, password_hash: String) -> Result<User> {
    let user = User {
      user_id:       Uuid::new_v4(),
      username:      input.username.trim().to_owned(),
      email:         normalize_email(&input.email),
      first_name:    input.first_name,
      last_name:     input.last_name,
      date_of_birth: input.date_of_birth,
      avatar:        MediaKind::Avatar.default_reference(),
      created_at:    Utc::now(),
    };

    let row = user.clone();
    self
      .write(move |tx| {
        ensure_email_free(tx, &row.email)?;
        ensure_username_free(tx, &row.username, None)?;
        tx.execute(
          "INSERT INTO users (
             user_id, username, email, first_name, last_name,
             date_of_birth, avatar, password_hash, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          params![
            encode_uuid(row.user_id),
            row.username,
            row.email,
            row.first_name,
            row.last_name,
            encode_date(row.date_of_birth),
            row.avatar.as_str(),
            password_hash,
            encode_dt(row.created_at),
          ],
        )?;
        Ok(())
      })
      .await?;

    tracing::info!(user_id = %user.user_id, username = %user.username, "registered user");
    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    self.read(move |conn| queries::user(conn, id)).await
  }

  async fn credentials_by_email<'a>(&'a self, email: &'a str) -> Result<Option<Credentials>> {
    let email = normalize_email(email);

    let raw: Option<(RawUser, String)> = self
      .read(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = ?1"),
              params![email],
              |row| Ok((RawUser::from_row(row)?, row.get(8)?)),
            )
            .optional()?,
        )
      })
      .await?;

    raw
      .map(|(raw, password_hash)| Ok(Credentials { user: raw.into_user()?, password_hash }))
      .transpose()
  }

  async fn find_users_by_text<'a>(&'a self, query: &'a UserQuery) -> Result<Vec<User>> {
    let text = query.text.trim().to_owned();
    let pattern = contains_pattern(&text);
    let limit = sql_limit(query.limit);
    let offset = query.offset.unwrap_or(0) as i64;

    self
      .read(move |conn| {
        queries::users_where(
          conn,
          &format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE username   LIKE ?1 ESCAPE '\\'
                OR first_name LIKE ?1 ESCAPE '\\'
                OR last_name  LIKE ?1 ESCAPE '\\'
             ORDER BY (username = ?2) DESC, username
             LIMIT ?3 OFFSET ?4"
          ),
          params![pattern, text, limit, offset],
        )
      })
      .await
  }

  async fn update_user(&self, id: Uuid, update: UserUpdate) -> Result<User> {
    self
      .write(move |tx| {
        queries::require_user(tx, id)?;
        let username = update.username.as_deref().map(str::trim);
        if let Some(username) = username {
          ensure_username_free(tx, username, Some(id))?;
        }

        tx.execute(
          "UPDATE users SET
             username      = COALESCE(?2, username),
             first_name    = COALESCE(?3, first_name),
             last_name     = COALESCE(?4, last_name),
             date_of_birth = COALESCE(?5, date_of_birth),
             password_hash = COALESCE(?6, password_hash)
           WHERE user_id = ?1",
          params![
            encode_uuid(id),
            username,
            update.first_name,
            update.last_name,
            update.date_of_birth.map(encode_date),
            update.password_hash,
          ],
        )?;
        queries::require_user(tx, id)
      })
      .await
  }

  async fn set_avatar(&self, id: Uuid, avatar: MediaRef) -> Result<MediaRef> {
    self
      .write(move |tx| {
        let previous = queries::require_user(tx, id)?.avatar;
        tx.execute(
          "UPDATE users SET avatar = ?2 WHERE user_id = ?1",
          params![encode_uuid(id), avatar.as_str()],
        )?;
        Ok(previous)
      })
      .await
  }

  async fn delete_user(&self, id: Uuid) -> Result<Vec<MediaRef>> {
    let released = self
      .write(move |tx| {
        let user = queries::require_user(tx, id)?;
        let id_str = encode_uuid(id);

        let mut stmt = tx.prepare("SELECT image FROM parties WHERE owner = ?1")?;
        let images = stmt
          .query_map(params![id_str], |r| r.get::<_, String>(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        drop(stmt);

        // Parties, participation, edges and pending rows all cascade.
        tx.execute("DELETE FROM users WHERE user_id = ?1", params![id_str])?;

        Ok(
          std::iter::once(user.avatar)
            .chain(images.into_iter().map(MediaRef::new))
            .filter(|media| !media.is_default())
            .collect::<Vec<_>>(),
        )
      })
      .await?;

    tracing::info!(user_id = %id, released = released.len(), "deleted user");
    Ok(released)
  }
}
