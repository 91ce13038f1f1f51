//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, dates of birth ISO 8601 dates. UUIDs are
//! stored as hyphenated lowercase strings.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use soiree_core::{
  media::MediaRef,
  membership::{PartyInvitation, PartyRequest},
  party::{GeoPoint, Party, PrivacyTier, TimeWindow},
  relationship::FriendInvitation,
  user::User,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── Dates ───────────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

// ─── PrivacyTier ─────────────────────────────────────────────────────────────

pub fn encode_privacy(p: PrivacyTier) -> &'static str {
  match p {
    PrivacyTier::Private => "private",
    PrivacyTier::Public => "public",
    PrivacyTier::Secret => "secret",
  }
}

pub fn decode_privacy(s: &str) -> Result<PrivacyTier> {
  match s {
    "private" => Ok(PrivacyTier::Private),
    "public" => Ok(PrivacyTier::Public),
    "secret" => Ok(PrivacyTier::Secret),
    other => Err(Error::Decode(format!("unknown privacy tier: {other:?}"))),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str =
  "user_id, username, email, first_name, last_name, date_of_birth, avatar, created_at";

/// Raw strings read directly from a `users` row, in [`USER_COLUMNS`] order.
pub struct RawUser {
  pub user_id:       String,
  pub username:      String,
  pub email:         String,
  pub first_name:    String,
  pub last_name:     String,
  pub date_of_birth: String,
  pub avatar:        String,
  pub created_at:    String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      username:      row.get(1)?,
      email:         row.get(2)?,
      first_name:    row.get(3)?,
      last_name:     row.get(4)?,
      date_of_birth: row.get(5)?,
      avatar:        row.get(6)?,
      created_at:    row.get(7)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:       decode_uuid(&self.user_id)?,
      username:      self.username,
      email:         self.email,
      first_name:    self.first_name,
      last_name:     self.last_name,
      date_of_birth: decode_date(&self.date_of_birth)?,
      avatar:        MediaRef::new(self.avatar),
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

pub const PARTY_COLUMNS: &str = "party_id, owner, name, description, privacy, latitude, \
                                 longitude, start_time, stop_time, image, created_at";

/// A `parties` row in [`PARTY_COLUMNS`] order. The participant set lives in
/// its own table and is attached by [`RawParty::into_party`].
pub struct RawParty {
  pub party_id:    String,
  pub owner:       String,
  pub name:        String,
  pub description: String,
  pub privacy:     String,
  pub latitude:    f64,
  pub longitude:   f64,
  pub start_time:  String,
  pub stop_time:   String,
  pub image:       String,
  pub created_at:  String,
}

impl RawParty {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      party_id:    row.get(0)?,
      owner:       row.get(1)?,
      name:        row.get(2)?,
      description: row.get(3)?,
      privacy:     row.get(4)?,
      latitude:    row.get(5)?,
      longitude:   row.get(6)?,
      start_time:  row.get(7)?,
      stop_time:   row.get(8)?,
      image:       row.get(9)?,
      created_at:  row.get(10)?,
    })
  }

  pub fn into_party(self, participants: Vec<String>) -> Result<Party> {
    let participants = participants
      .iter()
      .map(|s| decode_uuid(s))
      .collect::<Result<BTreeSet<_>>>()?;

    Ok(Party {
      party_id: decode_uuid(&self.party_id)?,
      owner: decode_uuid(&self.owner)?,
      name: self.name,
      description: self.description,
      privacy: decode_privacy(&self.privacy)?,
      location: GeoPoint { latitude: self.latitude, longitude: self.longitude },
      window: TimeWindow {
        start: decode_dt(&self.start_time)?,
        stop:  decode_dt(&self.stop_time)?,
      },
      participants,
      image: MediaRef::new(self.image),
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// `(id, party_or_sender, receiver_or_member, created_at)` for the three
/// pending-row tables, which share a shape.
pub struct RawPending {
  pub id:         String,
  pub first:      String,
  pub second:     String,
  pub created_at: String,
}

impl RawPending {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      first:      row.get(1)?,
      second:     row.get(2)?,
      created_at: row.get(3)?,
    })
  }

  /// `first` is the sender, `second` the receiver.
  pub fn into_friend_invitation(self) -> Result<FriendInvitation> {
    Ok(FriendInvitation {
      invitation_id: decode_uuid(&self.id)?,
      sender:        decode_uuid(&self.first)?,
      receiver:      decode_uuid(&self.second)?,
      created_at:    decode_dt(&self.created_at)?,
    })
  }

  /// `first` is the party, `second` the receiver.
  pub fn into_party_invitation(self) -> Result<PartyInvitation> {
    Ok(PartyInvitation {
      invitation_id: decode_uuid(&self.id)?,
      party_id:      decode_uuid(&self.first)?,
      receiver:      decode_uuid(&self.second)?,
      created_at:    decode_dt(&self.created_at)?,
    })
  }

  /// `first` is the party, `second` the sender.
  pub fn into_party_request(self) -> Result<PartyRequest> {
    Ok(PartyRequest {
      request_id: decode_uuid(&self.id)?,
      party_id:   decode_uuid(&self.first)?,
      sender:     decode_uuid(&self.second)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn privacy_round_trips_through_column_text() {
    for tier in [PrivacyTier::Private, PrivacyTier::Public, PrivacyTier::Secret] {
      assert_eq!(decode_privacy(encode_privacy(tier)).unwrap(), tier);
    }
    assert!(matches!(decode_privacy("hidden"), Err(Error::Decode(_))));
  }

  #[test]
  fn dates_keep_their_precision() {
    let now = Utc::now();
    assert_eq!(decode_dt(&encode_dt(now)).unwrap(), now);
    let dob = NaiveDate::from_ymd_opt(1999, 2, 28).unwrap();
    assert_eq!(encode_date(dob), "1999-02-28");
    assert_eq!(decode_date("1999-02-28").unwrap(), dob);
  }
}
