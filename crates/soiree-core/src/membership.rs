//! Party membership: owner-issued invitations, user-issued join requests and
//! departures.
//!
//! Like [`crate::relationship`], the functions here only decide. Stores load
//! the party inside a transaction, call the matching check and write only if
//! it passes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, lifecycle::Resolution, media::MediaRef, party::Party};

// ─── Records ─────────────────────────────────────────────────────────────────

/// An owner's pending invitation of `receiver` into a party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyInvitation {
  pub invitation_id: Uuid,
  pub party_id:      Uuid,
  pub receiver:      Uuid,
  pub created_at:    DateTime<Utc>,
}

/// A user's pending request to join a party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyRequest {
  pub request_id: Uuid,
  pub party_id:   Uuid,
  pub sender:     Uuid,
  pub created_at: DateTime<Utc>,
}

/// What happened when a user stopped participating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Departure {
  /// The user was removed from the participant set.
  Left,
  /// The owner left, so the party and everything hanging off it was deleted.
  /// `image` is the party's media, to be released by the caller.
  PartyDeleted { image: MediaRef },
}

// ─── Rules ───────────────────────────────────────────────────────────────────

pub fn check_owner(party: &Party, actor: Uuid) -> Result<()> {
  if !party.is_owner(actor) {
    return Err(Error::PermissionDenied("only the party owner can do this"));
  }
  Ok(())
}

/// `pending` is whether `receiver` already holds an invitation to this party.
pub fn check_invite(party: &Party, issuer: Uuid, receiver: Uuid, pending: bool) -> Result<()> {
  check_owner(party, issuer)?;
  if party.is_participant(receiver) {
    return Err(Error::AlreadyParticipant(receiver));
  }
  if pending {
    return Err(Error::DuplicateInvitation);
  }
  Ok(())
}

/// Only the invited user may accept; anyone else is refused, the same way a
/// non-owner accepting a join request is.
pub fn check_accept_invitation(invitation: &PartyInvitation, actor: Uuid) -> Result<()> {
  if actor != invitation.receiver {
    return Err(Error::PermissionDenied("only the invited user can accept"));
  }
  Ok(())
}

/// The receiver declines; the owner cancels.
pub fn discard_invitation_resolution(
  party: &Party,
  invitation: &PartyInvitation,
  actor: Uuid,
) -> Result<Resolution> {
  if actor == invitation.receiver {
    Ok(Resolution::Rejected)
  } else if party.is_owner(actor) {
    Ok(Resolution::Cancelled)
  } else {
    Err(Error::PermissionDenied("not a party to this invitation"))
  }
}

/// `visible` is the result of [`crate::visibility::can_see`] for `sender`.
pub fn check_request(party: &Party, sender: Uuid, visible: bool, pending: bool) -> Result<()> {
  if !visible {
    return Err(Error::PermissionDenied("you can not see this party"));
  }
  if party.is_participant(sender) {
    return Err(Error::AlreadyParticipant(sender));
  }
  if pending {
    return Err(Error::DuplicateInvitation);
  }
  Ok(())
}

pub fn check_accept_request(party: &Party, actor: Uuid) -> Result<()> { check_owner(party, actor) }

/// The owner declines; the sender cancels.
pub fn discard_request_resolution(
  party: &Party,
  request: &PartyRequest,
  actor: Uuid,
) -> Result<Resolution> {
  if party.is_owner(actor) {
    Ok(Resolution::Rejected)
  } else if actor == request.sender {
    Ok(Resolution::Cancelled)
  } else {
    Err(Error::PermissionDenied("not a party to this request"))
  }
}

/// Decide what removing `user` from `party` on behalf of `actor` means.
///
/// The owner may remove anyone; everyone else may only remove themselves.
/// The owner leaving deletes the whole party.
pub fn departure(party: &Party, actor: Uuid, user: Uuid) -> Result<Departure> {
  if actor != user && !party.is_owner(actor) {
    return Err(Error::PermissionDenied("only the owner can remove other participants"));
  }
  if !party.is_participant(user) {
    return Err(Error::NotParticipant(user));
  }
  if party.is_owner(user) {
    Ok(Departure::PartyDeleted { image: party.image.clone() })
  } else {
    Ok(Departure::Left)
  }
}
