use chrono::Utc;
use rusqlite::{params, params_from_iter, types::Value};
use soiree_core::{
  Error as CoreError,
  lifecycle::Resolution,
  media::{MediaKind, MediaRef},
  membership::{
    Departure, PartyInvitation, PartyRequest, check_accept_invitation, check_accept_request,
    check_invite, check_owner, check_request, departure, discard_invitation_resolution,
    discard_request_resolution,
  },
  party::{NewParty, Party, PartyQuery, PartyUpdate},
  store::{MembershipFilter, PartyStore},
  visibility::can_see,
};
use uuid::Uuid;

use super::{SqliteStore, contains_pattern};
use crate::{
  Result,
  encode::{PARTY_COLUMNS, RawPending, encode_dt, encode_privacy, encode_uuid},
  queries,
};

/// Translate a [`PartyQuery`] into a `WHERE` clause and its positional
/// arguments. The geo part is only a bounding box; callers still check the
/// exact distance.
fn search_clause(query: &PartyQuery) -> (String, Vec<Value>) {
  let mut conds: Vec<&'static str> = vec![];
  let mut args: Vec<Value> = vec![];

  if let Some(text) = query.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
    let pattern = contains_pattern(text);
    conds.push("(name LIKE ? ESCAPE '\\' OR description LIKE ? ESCAPE '\\')");
    args.push(Value::Text(pattern.clone()));
    args.push(Value::Text(pattern));
  }
  if let Some(owner) = query.owner {
    conds.push("owner = ?");
    args.push(Value::Text(encode_uuid(owner)));
  }
  if let Some(participant) = query.participant {
    conds.push("party_id IN (SELECT party_id FROM participants WHERE user_id = ?)");
    args.push(Value::Text(encode_uuid(participant)));
  }
  if let Some(near) = query.near {
    let bbox = near.center.bounding_box(near.radius_m);
    conds.push("latitude BETWEEN ? AND ?");
    args.push(Value::Real(bbox.min_lat));
    args.push(Value::Real(bbox.max_lat));

    if bbox.min_lon < -180.0 {
      conds.push("(longitude >= ? OR longitude <= ?)");
      args.push(Value::Real(bbox.min_lon + 360.0));
      args.push(Value::Real(bbox.max_lon));
    } else if bbox.max_lon > 180.0 {
      conds.push("(longitude >= ? OR longitude <= ?)");
      args.push(Value::Real(bbox.min_lon));
      args.push(Value::Real(bbox.max_lon - 360.0));
    } else {
      conds.push("longitude BETWEEN ? AND ?");
      args.push(Value::Real(bbox.min_lon));
      args.push(Value::Real(bbox.max_lon));
    }
  }

  let where_clause = if conds.is_empty() {
    String::new()
  } else {
    format!("WHERE {}", conds.join(" AND "))
  };
  (where_clause, args)
}

fn write_party_fields(conn: &rusqlite::Connection, party: &Party) -> Result<()> {
  conn.execute(
    "UPDATE parties SET
       name = ?2, description = ?3, privacy = ?4, latitude = ?5, longitude = ?6,
       start_time = ?7, stop_time = ?8
     WHERE party_id = ?1",
    params![
      encode_uuid(party.party_id),
      party.name,
      party.description,
      encode_privacy(party.privacy),
      party.location.latitude,
      party.location.longitude,
      encode_dt(party.window.start),
      encode_dt(party.window.stop),
    ],
  )?;
  Ok(())
}

impl PartyStore for SqliteStore {
  async fn create_party(&self, owner: Uuid, input: NewParty) -> Result<Party> {
    input.validate()?;

    let party = Party {
      party_id:     Uuid::new_v4(),
      owner,
      name:         input.name.trim().to_owned(),
      description:  input.description,
      privacy:      input.privacy,
      location:     input.location,
      window:       input.window,
      participants: [owner].into(),
      image:        MediaKind::PartyImage.default_reference(),
      created_at:   Utc::now(),
    };

    let row = party.clone();
    self
      .write(move |tx| {
        queries::require_user(tx, owner)?;
        tx.execute(
          &format!(
            "INSERT INTO parties ({PARTY_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
          ),
          params![
            encode_uuid(row.party_id),
            encode_uuid(row.owner),
            row.name,
            row.description,
            encode_privacy(row.privacy),
            row.location.latitude,
            row.location.longitude,
            encode_dt(row.window.start),
            encode_dt(row.window.stop),
            row.image.as_str(),
            encode_dt(row.created_at),
          ],
        )?;
        queries::insert_participant(tx, row.party_id, owner, row.created_at)
      })
      .await?;

    tracing::info!(party_id = %party.party_id, %owner, privacy = ?party.privacy, "created party");
    Ok(party)
  }

  async fn get_party(&self, id: Uuid) -> Result<Option<Party>> {
    self.read(move |conn| queries::party(conn, id)).await
  }

  async fn search_parties<'a>(&'a self, query: &'a PartyQuery) -> Result<Vec<Party>> {
    let (where_clause, args) = search_clause(query);
    let near = query.near;

    let mut parties = self
      .read(move |conn| {
        queries::parties_where(
          conn,
          &format!("SELECT {PARTY_COLUMNS} FROM parties {where_clause} ORDER BY rowid"),
          params_from_iter(args),
        )
      })
      .await?;

    if let Some(near) = near {
      parties.retain(|p| p.location.distance_m(&near.center) <= near.radius_m);
    }
    Ok(parties)
  }

  async fn update_party(&self, id: Uuid, actor: Uuid, update: PartyUpdate) -> Result<Party> {
    self
      .write(move |tx| {
        let party = queries::require_party(tx, id)?;
        check_owner(&party, actor)?;
        let next = update.apply_to(&party)?;

        write_party_fields(tx, &next)?;
        for removed in party.participants.difference(&next.participants) {
          tx.execute(
            "DELETE FROM participants WHERE party_id = ?1 AND user_id = ?2",
            params![encode_uuid(id), encode_uuid(*removed)],
          )?;
        }
        queries::require_party(tx, id)
      })
      .await
  }

  async fn set_party_image(&self, id: Uuid, actor: Uuid, image: MediaRef) -> Result<MediaRef> {
    self
      .write(move |tx| {
        let party = queries::require_party(tx, id)?;
        check_owner(&party, actor)?;
        tx.execute(
          "UPDATE parties SET image = ?2 WHERE party_id = ?1",
          params![encode_uuid(id), image.as_str()],
        )?;
        Ok(party.image)
      })
      .await
  }

  async fn remove_participant(&self, id: Uuid, actor: Uuid, user: Uuid) -> Result<Departure> {
    let outcome = self
      .write(move |tx| {
        let party = queries::require_party(tx, id)?;
        let outcome = departure(&party, actor, user)?;
        match outcome {
          Departure::Left => {
            tx.execute(
              "DELETE FROM participants WHERE party_id = ?1 AND user_id = ?2",
              params![encode_uuid(id), encode_uuid(user)],
            )?;
          }
          // Invitations, requests and participation cascade.
          Departure::PartyDeleted { .. } => {
            tx.execute("DELETE FROM parties WHERE party_id = ?1", params![encode_uuid(id)])?;
          }
        }
        Ok(outcome)
      })
      .await?;

    match &outcome {
      Departure::Left => tracing::debug!(party_id = %id, %user, "participant left"),
      Departure::PartyDeleted { .. } => tracing::info!(party_id = %id, "deleted party"),
    }
    Ok(outcome)
  }

  // ── Invitations ─────────────────────────────────────────────────────────

  async fn invite_to_party(
    &self,
    party_id: Uuid,
    issuer: Uuid,
    receiver: Uuid,
  ) -> Result<PartyInvitation> {
    let invitation = PartyInvitation {
      invitation_id: Uuid::new_v4(),
      party_id,
      receiver,
      created_at: Utc::now(),
    };

    let row = invitation.clone();
    self
      .write(move |tx| {
        let party = queries::require_party(tx, party_id)?;
        let pending = queries::has_party_invitation(tx, party_id, receiver)?;
        check_invite(&party, issuer, receiver, pending)?;
        if !queries::user_exists(tx, receiver)? {
          return Err(CoreError::UserNotFound(receiver).into());
        }

        tx.execute(
          "INSERT INTO party_invitations (invitation_id, party_id, receiver, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          params![
            encode_uuid(row.invitation_id),
            encode_uuid(row.party_id),
            encode_uuid(row.receiver),
            encode_dt(row.created_at),
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(invitation)
  }

  async fn get_party_invitation(&self, id: Uuid) -> Result<Option<PartyInvitation>> {
    self.read(move |conn| queries::party_invitation(conn, id)).await
  }

  async fn list_party_invitations(&self, filter: MembershipFilter) -> Result<Vec<PartyInvitation>> {
    let (column, id) = match filter {
      MembershipFilter::Party(id) => ("party_id", id),
      MembershipFilter::User(id) => ("receiver", id),
    };

    self
      .read(move |conn| {
        queries::pending_where(
          conn,
          &format!(
            "SELECT invitation_id, party_id, receiver, created_at
             FROM party_invitations WHERE {column} = ?1 ORDER BY rowid"
          ),
          params![encode_uuid(id)],
        )?
        .into_iter()
        .map(RawPending::into_party_invitation)
        .collect()
      })
      .await
  }

  async fn accept_party_invitation(&self, id: Uuid, actor: Uuid) -> Result<Party> {
    let party = self
      .write(move |tx| {
        let invitation =
          queries::party_invitation(tx, id)?.ok_or(CoreError::InvitationNotFound(id))?;
        check_accept_invitation(&invitation, actor)?;

        queries::insert_participant(tx, invitation.party_id, invitation.receiver, Utc::now())?;
        queries::clear_pending_membership(tx, invitation.party_id, invitation.receiver)?;
        queries::require_party(tx, invitation.party_id)
      })
      .await?;

    tracing::info!(party_id = %party.party_id, user = %actor, "party invitation accepted");
    Ok(party)
  }

  async fn discard_party_invitation(&self, id: Uuid, actor: Uuid) -> Result<Resolution> {
    self
      .write(move |tx| {
        let invitation =
          queries::party_invitation(tx, id)?.ok_or(CoreError::InvitationNotFound(id))?;
        let party = queries::require_party(tx, invitation.party_id)?;
        let resolution = discard_invitation_resolution(&party, &invitation, actor)?;
        tx.execute(
          "DELETE FROM party_invitations WHERE invitation_id = ?1",
          params![encode_uuid(id)],
        )?;
        Ok(resolution)
      })
      .await
  }

  // ── Requests ────────────────────────────────────────────────────────────

  async fn request_to_join(&self, party_id: Uuid, sender: Uuid) -> Result<PartyRequest> {
    let request = PartyRequest {
      request_id: Uuid::new_v4(),
      party_id,
      sender,
      created_at: Utc::now(),
    };

    let row = request.clone();
    self
      .write(move |tx| {
        let party = queries::require_party(tx, party_id)?;
        let friend = party.privacy.needs_friendship()
          && !party.is_owner(sender)
          && queries::is_friend(tx, party.owner, sender)?;
        let pending = queries::has_party_request(tx, party_id, sender)?;
        check_request(&party, sender, can_see(&party, sender, friend), pending)?;

        tx.execute(
          "INSERT INTO party_requests (request_id, party_id, sender, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          params![
            encode_uuid(row.request_id),
            encode_uuid(row.party_id),
            encode_uuid(row.sender),
            encode_dt(row.created_at),
          ],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(%party_id, %sender, "join request sent");
    Ok(request)
  }

  async fn get_party_request(&self, id: Uuid) -> Result<Option<PartyRequest>> {
    self.read(move |conn| queries::party_request(conn, id)).await
  }

  async fn list_party_requests(&self, filter: MembershipFilter) -> Result<Vec<PartyRequest>> {
    let (column, id) = match filter {
      MembershipFilter::Party(id) => ("party_id", id),
      MembershipFilter::User(id) => ("sender", id),
    };

    self
      .read(move |conn| {
        queries::pending_where(
          conn,
          &format!(
            "SELECT request_id, party_id, sender, created_at
             FROM party_requests WHERE {column} = ?1 ORDER BY rowid"
          ),
          params![encode_uuid(id)],
        )?
        .into_iter()
        .map(RawPending::into_party_request)
        .collect()
      })
      .await
  }

  async fn accept_party_request(&self, id: Uuid, actor: Uuid) -> Result<Party> {
    let party = self
      .write(move |tx| {
        let request = queries::party_request(tx, id)?.ok_or(CoreError::RequestNotFound(id))?;
        let party = queries::require_party(tx, request.party_id)?;
        check_accept_request(&party, actor)?;

        queries::insert_participant(tx, request.party_id, request.sender, Utc::now())?;
        queries::clear_pending_membership(tx, request.party_id, request.sender)?;
        queries::require_party(tx, request.party_id)
      })
      .await?;

    tracing::info!(party_id = %party.party_id, "join request accepted");
    Ok(party)
  }

  async fn discard_party_request(&self, id: Uuid, actor: Uuid) -> Result<Resolution> {
    self
      .write(move |tx| {
        let request = queries::party_request(tx, id)?.ok_or(CoreError::RequestNotFound(id))?;
        let party = queries::require_party(tx, request.party_id)?;
        let resolution = discard_request_resolution(&party, &request, actor)?;
        tx.execute(
          "DELETE FROM party_requests WHERE request_id = ?1",
          params![encode_uuid(id)],
        )?;
        Ok(resolution)
      })
      .await
  }
}
