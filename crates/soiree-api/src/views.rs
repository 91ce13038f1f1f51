//! Response shapes.
//!
//! Each operation returns a purpose-built view rather than the raw domain
//! record, so what a caller sees never depends on who is asking beyond the
//! choice of view.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use soiree_core::{
  media::MediaRef,
  membership::{PartyInvitation, PartyRequest},
  party::{GeoPoint, Party, PrivacyTier},
  relationship::FriendInvitation,
  user::User,
};
use uuid::Uuid;

/// The caller's own account.
#[derive(Debug, Serialize)]
pub struct UserView {
  pub user_id:       Uuid,
  pub username:      String,
  pub email:         String,
  pub first_name:    String,
  pub last_name:     String,
  pub date_of_birth: NaiveDate,
  pub avatar:        MediaRef,
  pub created_at:    DateTime<Utc>,
}

impl From<User> for UserView {
  fn from(u: User) -> Self {
    Self {
      user_id:       u.user_id,
      username:      u.username,
      email:         u.email,
      first_name:    u.first_name,
      last_name:     u.last_name,
      date_of_birth: u.date_of_birth,
      avatar:        u.avatar,
      created_at:    u.created_at,
    }
  }
}

/// What anyone may see about a user.
#[derive(Debug, Serialize)]
pub struct ProfileView {
  pub user_id:    Uuid,
  pub username:   String,
  pub first_name: String,
  pub last_name:  String,
  pub avatar:     MediaRef,
}

impl From<User> for ProfileView {
  fn from(u: User) -> Self {
    Self {
      user_id:    u.user_id,
      username:   u.username,
      first_name: u.first_name,
      last_name:  u.last_name,
      avatar:     u.avatar,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct PartyView {
  pub party_id:     Uuid,
  pub owner:        Uuid,
  pub name:         String,
  pub description:  String,
  pub privacy:      PrivacyTier,
  pub location:     GeoPoint,
  pub start:        DateTime<Utc>,
  pub stop:         DateTime<Utc>,
  pub participants: BTreeSet<Uuid>,
  pub image:        MediaRef,
  pub created_at:   DateTime<Utc>,
}

impl From<Party> for PartyView {
  fn from(p: Party) -> Self {
    Self {
      party_id:     p.party_id,
      owner:        p.owner,
      name:         p.name,
      description:  p.description,
      privacy:      p.privacy,
      location:     p.location,
      start:        p.window.start,
      stop:         p.window.stop,
      participants: p.participants,
      image:        p.image,
      created_at:   p.created_at,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct FriendInvitationView {
  pub invitation_id: Uuid,
  pub sender:        Uuid,
  pub receiver:      Uuid,
  pub created_at:    DateTime<Utc>,
}

impl From<FriendInvitation> for FriendInvitationView {
  fn from(i: FriendInvitation) -> Self {
    Self {
      invitation_id: i.invitation_id,
      sender:        i.sender,
      receiver:      i.receiver,
      created_at:    i.created_at,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct PartyInvitationView {
  pub invitation_id: Uuid,
  pub party_id:      Uuid,
  pub receiver:      Uuid,
  pub created_at:    DateTime<Utc>,
}

impl From<PartyInvitation> for PartyInvitationView {
  fn from(i: PartyInvitation) -> Self {
    Self {
      invitation_id: i.invitation_id,
      party_id:      i.party_id,
      receiver:      i.receiver,
      created_at:    i.created_at,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct PartyRequestView {
  pub request_id: Uuid,
  pub party_id:   Uuid,
  pub sender:     Uuid,
  pub created_at: DateTime<Utc>,
}

impl From<PartyRequest> for PartyRequestView {
  fn from(r: PartyRequest) -> Self {
    Self {
      request_id: r.request_id,
      party_id:   r.party_id,
      sender:     r.sender,
      created_at: r.created_at,
    }
  }
}

/// Convert a list of records into their views.
pub fn many<T, V: From<T>>(items: Vec<T>) -> Vec<V> { items.into_iter().map(V::from).collect() }
