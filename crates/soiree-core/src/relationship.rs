//! Friendships and friend invitations.
//!
//! A friendship is an unordered pair stored as two directed edges. The rule
//! functions here are pure; stores call them inside the transaction that
//! performs the write so a rejected check never leaves partial state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, lifecycle::Resolution};

/// A pending friendship proposal from `sender` to `receiver`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendInvitation {
  pub invitation_id: Uuid,
  pub sender:        Uuid,
  pub receiver:      Uuid,
  pub created_at:    DateTime<Utc>,
}

/// Which side of the invitation table to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvitationDirection {
  Received,
  Sent,
}

/// Both directed edges that make up the friendship `{a, b}`.
pub fn edges(a: Uuid, b: Uuid) -> [(Uuid, Uuid); 2] { [(a, b), (b, a)] }

/// A friendship needs two distinct users.
pub fn check_pair(a: Uuid, b: Uuid) -> Result<()> {
  if a == b {
    return Err(Error::SelfReference);
  }
  Ok(())
}

/// Decide whether `sender` may invite `receiver`.
///
/// `pending` is whether an invitation already exists between the two users in
/// *either* direction.
pub fn check_proposal(
  sender: Uuid,
  receiver: Uuid,
  already_friends: bool,
  pending: bool,
) -> Result<()> {
  check_pair(sender, receiver)?;
  if pending {
    return Err(Error::DuplicateInvitation);
  }
  if already_friends {
    return Err(Error::AlreadyFriends);
  }
  Ok(())
}

/// Only the receiver may accept.
pub fn check_accept(invitation: &FriendInvitation, actor: Uuid) -> Result<()> {
  if actor != invitation.receiver {
    return Err(Error::PermissionDenied("only the receiver can accept an invitation"));
  }
  Ok(())
}

/// The receiver rejects; the sender cancels. Anyone else is refused.
pub fn discard_resolution(invitation: &FriendInvitation, actor: Uuid) -> Result<Resolution> {
  if actor == invitation.receiver {
    Ok(Resolution::Rejected)
  } else if actor == invitation.sender {
    Ok(Resolution::Cancelled)
  } else {
    Err(Error::PermissionDenied("not a party to this invitation"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn invitation() -> FriendInvitation {
    FriendInvitation {
      invitation_id: Uuid::new_v4(),
      sender:        Uuid::new_v4(),
      receiver:      Uuid::new_v4(),
      created_at:    Utc::now(),
    }
  }

  #[test]
  fn self_pairs_are_rejected() {
    let a = Uuid::new_v4();
    assert_eq!(check_pair(a, a), Err(Error::SelfReference));
    assert_eq!(check_proposal(a, a, false, false), Err(Error::SelfReference));
  }

  #[test]
  fn pending_in_either_direction_is_a_duplicate() {
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    assert_eq!(check_proposal(a, b, false, true), Err(Error::DuplicateInvitation));
    assert_eq!(check_proposal(a, b, true, false), Err(Error::AlreadyFriends));
    assert!(check_proposal(a, b, false, false).is_ok());
  }

  #[test]
  fn only_receiver_accepts() {
    let inv = invitation();
    assert!(check_accept(&inv, inv.receiver).is_ok());
    assert!(matches!(check_accept(&inv, inv.sender), Err(Error::PermissionDenied(_))));
  }

  #[test]
  fn discard_depends_on_actor() {
    let inv = invitation();
    assert_eq!(discard_resolution(&inv, inv.receiver), Ok(Resolution::Rejected));
    assert_eq!(discard_resolution(&inv, inv.sender), Ok(Resolution::Cancelled));
    assert!(discard_resolution(&inv, Uuid::new_v4()).is_err());
  }
}
