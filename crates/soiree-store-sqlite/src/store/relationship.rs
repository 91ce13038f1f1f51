use std::collections::BTreeSet;

use chrono::Utc;
use rusqlite::params;
use soiree_core::{
  Error as CoreError,
  lifecycle::Resolution,
  relationship::{
    FriendInvitation, InvitationDirection, check_accept, check_pair, check_proposal,
    discard_resolution,
  },
  store::RelationshipStore,
  user::User,
};
use uuid::Uuid;

use super::SqliteStore;
use crate::{
  Result,
  encode::{RawPending, USER_COLUMNS, decode_uuid, encode_dt, encode_uuid},
  queries,
};

fn delete_invitations_between(conn: &rusqlite::Connection, a: Uuid, b: Uuid) -> Result<()> {
  conn.execute(
    "DELETE FROM friend_invitations
     WHERE (sender = ?1 AND receiver = ?2) OR (sender = ?2 AND receiver = ?1)",
    params![encode_uuid(a), encode_uuid(b)],
  )?;
  Ok(())
}

impl RelationshipStore for SqliteStore {
  async fn add_friend(&self, a: Uuid, b: Uuid) -> Result<()> {
    self
      .write(move |tx| {
        check_pair(a, b)?;
        queries::require_user(tx, a)?;
        queries::require_user(tx, b)?;
        queries::insert_friendship(tx, a, b, Utc::now())?;
        delete_invitations_between(tx, a, b)
      })
      .await
  }

  async fn remove_friend(&self, a: Uuid, b: Uuid) -> Result<bool> {
    self
      .write(move |tx| {
        let mut removed = 0;
        for (from, to) in soiree_core::relationship::edges(a, b) {
          removed += tx.execute(
            "DELETE FROM friendships WHERE user_id = ?1 AND friend_id = ?2",
            params![encode_uuid(from), encode_uuid(to)],
          )?;
        }
        Ok(removed > 0)
      })
      .await
  }

  async fn is_friend(&self, a: Uuid, b: Uuid) -> Result<bool> {
    self.read(move |conn| queries::is_friend(conn, a, b)).await
  }

  async fn list_friends(&self, user: Uuid) -> Result<Vec<User>> {
    self
      .read(move |conn| {
        queries::users_where(
          conn,
          &format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE user_id IN (SELECT friend_id FROM friendships WHERE user_id = ?1)
             ORDER BY username"
          ),
          params![encode_uuid(user)],
        )
      })
      .await
  }

  async fn friend_ids(&self, user: Uuid) -> Result<BTreeSet<Uuid>> {
    self
      .read(move |conn| {
        let mut stmt = conn.prepare("SELECT friend_id FROM friendships WHERE user_id = ?1")?;
        let ids = stmt
          .query_map(params![encode_uuid(user)], |r| r.get::<_, String>(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        ids.iter().map(|id| decode_uuid(id)).collect()
      })
      .await
  }

  async fn propose_invitation(&self, sender: Uuid, receiver: Uuid) -> Result<FriendInvitation> {
    let invitation = FriendInvitation {
      invitation_id: Uuid::new_v4(),
      sender,
      receiver,
      created_at: Utc::now(),
    };

    let row = invitation.clone();
    self
      .write(move |tx| {
        check_pair(sender, receiver)?;
        if !queries::user_exists(tx, receiver)? {
          return Err(CoreError::UserNotFound(receiver).into());
        }
        let already_friends = queries::is_friend(tx, sender, receiver)?;
        let pending = queries::friend_invitation_between(tx, sender, receiver)?;
        check_proposal(sender, receiver, already_friends, pending)?;

        tx.execute(
          "INSERT INTO friend_invitations (invitation_id, sender, receiver, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          params![
            encode_uuid(row.invitation_id),
            encode_uuid(row.sender),
            encode_uuid(row.receiver),
            encode_dt(row.created_at),
          ],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(%sender, %receiver, "friend invitation sent");
    Ok(invitation)
  }

  async fn get_friend_invitation(&self, id: Uuid) -> Result<Option<FriendInvitation>> {
    self.read(move |conn| queries::friend_invitation(conn, id)).await
  }

  async fn list_friend_invitations(
    &self,
    user: Uuid,
    direction: InvitationDirection,
  ) -> Result<Vec<FriendInvitation>> {
    let column = match direction {
      InvitationDirection::Received => "receiver",
      InvitationDirection::Sent => "sender",
    };

    self
      .read(move |conn| {
        queries::pending_where(
          conn,
          &format!(
            "SELECT invitation_id, sender, receiver, created_at
             FROM friend_invitations WHERE {column} = ?1
             ORDER BY rowid"
          ),
          params![encode_uuid(user)],
        )?
        .into_iter()
        .map(RawPending::into_friend_invitation)
        .collect()
      })
      .await
  }

  async fn accept_friend_invitation(&self, id: Uuid, actor: Uuid) -> Result<FriendInvitation> {
    let invitation = self
      .write(move |tx| {
        let invitation = queries::friend_invitation(tx, id)?
          .ok_or(CoreError::InvitationNotFound(id))?;
        check_accept(&invitation, actor)?;

        queries::insert_friendship(tx, invitation.sender, invitation.receiver, Utc::now())?;
        delete_invitations_between(tx, invitation.sender, invitation.receiver)?;
        Ok(invitation)
      })
      .await?;

    tracing::info!(
      sender = %invitation.sender,
      receiver = %invitation.receiver,
      "friend invitation accepted",
    );
    Ok(invitation)
  }

  async fn discard_friend_invitation(&self, id: Uuid, actor: Uuid) -> Result<Resolution> {
    self
      .write(move |tx| {
        let invitation = queries::friend_invitation(tx, id)?
          .ok_or(CoreError::InvitationNotFound(id))?;
        let resolution = discard_resolution(&invitation, actor)?;
        tx.execute(
          "DELETE FROM friend_invitations WHERE invitation_id = ?1",
          params![encode_uuid(id)],
        )?;
        Ok(resolution)
      })
      .await
  }
}
