//! Synchronous row helpers shared by the trait impls.
//!
//! Everything here runs on the `tokio_rusqlite` connection thread and takes a
//! plain [`Connection`]; a [`rusqlite::Transaction`] derefs to one, so the same
//! helpers serve both reads and the checks inside write transactions.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension as _, params};
use soiree_core::{
  Error as CoreError,
  membership::{PartyInvitation, PartyRequest},
  party::Party,
  relationship::FriendInvitation,
  user::User,
};
use uuid::Uuid;

use crate::{
  Result,
  encode::{
    PARTY_COLUMNS, RawParty, RawPending, RawUser, USER_COLUMNS, encode_dt, encode_uuid,
  },
};

// ─── Users ───────────────────────────────────────────────────────────────────

pub fn user(conn: &Connection, id: Uuid) -> Result<Option<User>> {
  let raw = conn
    .query_row(
      &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
      params![encode_uuid(id)],
      RawUser::from_row,
    )
    .optional()?;
  raw.map(RawUser::into_user).transpose()
}

pub fn require_user(conn: &Connection, id: Uuid) -> Result<User> {
  user(conn, id)?.ok_or_else(|| CoreError::UserNotFound(id).into())
}

pub fn user_exists(conn: &Connection, id: Uuid) -> Result<bool> {
  Ok(
    conn
      .query_row("SELECT 1 FROM users WHERE user_id = ?1", params![encode_uuid(id)], |_| {
        Ok(())
      })
      .optional()?
      .is_some(),
  )
}

/// Users selected by `sql`, which must project [`USER_COLUMNS`].
pub fn users_where(
  conn: &Connection,
  sql: &str,
  args: impl rusqlite::Params,
) -> Result<Vec<User>> {
  let mut stmt = conn.prepare(sql)?;
  let raws = stmt
    .query_map(args, RawUser::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawUser::into_user).collect()
}

// ─── Friendships ─────────────────────────────────────────────────────────────

pub fn is_friend(conn: &Connection, a: Uuid, b: Uuid) -> Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM friendships WHERE user_id = ?1 AND friend_id = ?2",
        params![encode_uuid(a), encode_uuid(b)],
        |_| Ok(()),
      )
      .optional()?
      .is_some(),
  )
}

/// Insert both directed edges; existing edges are left alone.
pub fn insert_friendship(conn: &Connection, a: Uuid, b: Uuid, at: DateTime<Utc>) -> Result<()> {
  let at = encode_dt(at);
  for (from, to) in soiree_core::relationship::edges(a, b) {
    conn.execute(
      "INSERT OR IGNORE INTO friendships (user_id, friend_id, created_at) VALUES (?1, ?2, ?3)",
      params![encode_uuid(from), encode_uuid(to), at],
    )?;
  }
  Ok(())
}

pub fn friend_invitation(conn: &Connection, id: Uuid) -> Result<Option<FriendInvitation>> {
  let raw = conn
    .query_row(
      "SELECT invitation_id, sender, receiver, created_at
       FROM friend_invitations WHERE invitation_id = ?1",
      params![encode_uuid(id)],
      RawPending::from_row,
    )
    .optional()?;
  raw.map(RawPending::into_friend_invitation).transpose()
}

/// Whether a pending invitation exists between `a` and `b` in either
/// direction.
pub fn friend_invitation_between(conn: &Connection, a: Uuid, b: Uuid) -> Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM friend_invitations
         WHERE (sender = ?1 AND receiver = ?2) OR (sender = ?2 AND receiver = ?1)",
        params![encode_uuid(a), encode_uuid(b)],
        |_| Ok(()),
      )
      .optional()?
      .is_some(),
  )
}

// ─── Parties ─────────────────────────────────────────────────────────────────

fn participant_ids(conn: &Connection, party_id: &str) -> Result<Vec<String>> {
  let mut stmt = conn.prepare_cached(
    "SELECT user_id FROM participants WHERE party_id = ?1 ORDER BY joined_at, user_id",
  )?;
  let ids = stmt
    .query_map(params![party_id], |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<String>>>()?;
  Ok(ids)
}

fn attach_participants(conn: &Connection, raw: RawParty) -> Result<Party> {
  let ids = participant_ids(conn, &raw.party_id)?;
  raw.into_party(ids)
}

pub fn party(conn: &Connection, id: Uuid) -> Result<Option<Party>> {
  let raw = conn
    .query_row(
      &format!("SELECT {PARTY_COLUMNS} FROM parties WHERE party_id = ?1"),
      params![encode_uuid(id)],
      RawParty::from_row,
    )
    .optional()?;
  raw.map(|raw| attach_participants(conn, raw)).transpose()
}

pub fn require_party(conn: &Connection, id: Uuid) -> Result<Party> {
  party(conn, id)?.ok_or_else(|| CoreError::PartyNotFound(id).into())
}

/// Parties selected by `sql`, which must project [`PARTY_COLUMNS`].
pub fn parties_where(
  conn: &Connection,
  sql: &str,
  args: impl rusqlite::Params,
) -> Result<Vec<Party>> {
  let mut stmt = conn.prepare(sql)?;
  let raws = stmt
    .query_map(args, RawParty::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(|raw| attach_participants(conn, raw)).collect()
}

pub fn insert_participant(
  conn: &Connection,
  party_id: Uuid,
  user_id: Uuid,
  at: DateTime<Utc>,
) -> Result<()> {
  conn.execute(
    "INSERT OR IGNORE INTO participants (party_id, user_id, joined_at) VALUES (?1, ?2, ?3)",
    params![encode_uuid(party_id), encode_uuid(user_id), encode_dt(at)],
  )?;
  Ok(())
}

/// Everything that was waiting on `user` joining `party` is now moot.
pub fn clear_pending_membership(conn: &Connection, party_id: Uuid, user_id: Uuid) -> Result<()> {
  let (party_id, user_id) = (encode_uuid(party_id), encode_uuid(user_id));
  conn.execute(
    "DELETE FROM party_invitations WHERE party_id = ?1 AND receiver = ?2",
    params![party_id, user_id],
  )?;
  conn.execute(
    "DELETE FROM party_requests WHERE party_id = ?1 AND sender = ?2",
    params![party_id, user_id],
  )?;
  Ok(())
}

// ─── Membership rows ─────────────────────────────────────────────────────────

pub fn party_invitation(conn: &Connection, id: Uuid) -> Result<Option<PartyInvitation>> {
  let raw = conn
    .query_row(
      "SELECT invitation_id, party_id, receiver, created_at
       FROM party_invitations WHERE invitation_id = ?1",
      params![encode_uuid(id)],
      RawPending::from_row,
    )
    .optional()?;
  raw.map(RawPending::into_party_invitation).transpose()
}

pub fn party_request(conn: &Connection, id: Uuid) -> Result<Option<PartyRequest>> {
  let raw = conn
    .query_row(
      "SELECT request_id, party_id, sender, created_at
       FROM party_requests WHERE request_id = ?1",
      params![encode_uuid(id)],
      RawPending::from_row,
    )
    .optional()?;
  raw.map(RawPending::into_party_request).transpose()
}

pub fn has_party_invitation(conn: &Connection, party_id: Uuid, receiver: Uuid) -> Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM party_invitations WHERE party_id = ?1 AND receiver = ?2",
        params![encode_uuid(party_id), encode_uuid(receiver)],
        |_| Ok(()),
      )
      .optional()?
      .is_some(),
  )
}

pub fn has_party_request(conn: &Connection, party_id: Uuid, sender: Uuid) -> Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM party_requests WHERE party_id = ?1 AND sender = ?2",
        params![encode_uuid(party_id), encode_uuid(sender)],
        |_| Ok(()),
      )
      .optional()?
      .is_some(),
  )
}

/// Rows of one of the pending tables selected by `sql`.
pub fn pending_where(
  conn: &Connection,
  sql: &str,
  args: impl rusqlite::Params,
) -> Result<Vec<RawPending>> {
  let mut stmt = conn.prepare(sql)?;
  let rows = stmt
    .query_map(args, RawPending::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}
