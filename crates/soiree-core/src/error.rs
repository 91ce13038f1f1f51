//! Error types for `soiree-core`.
//!
//! Every rule violation raised by the relationship, visibility and membership
//! rules is one of these variants. Storage backends wrap them unchanged so the
//! API layer can map each one to a client-visible rejection.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("party not found: {0}")]
  PartyNotFound(Uuid),

  #[error("invitation not found: {0}")]
  InvitationNotFound(Uuid),

  #[error("request not found: {0}")]
  RequestNotFound(Uuid),

  /// The acting user lacks the rights for this operation.
  #[error("permission denied: {0}")]
  PermissionDenied(&'static str),

  #[error("a user cannot target themselves here")]
  SelfReference,

  /// A pending invitation or request already exists for this pair.
  #[error("a pending invitation already exists")]
  DuplicateInvitation,

  #[error("user {0} already participates in this party")]
  AlreadyParticipant(Uuid),

  #[error("users are already friends")]
  AlreadyFriends,

  #[error("user {0} does not participate in this party")]
  NotParticipant(Uuid),

  #[error("validation failed: {0}")]
  Validation(String),
}

impl Error {
  pub fn validation(msg: impl Into<String>) -> Self { Self::Validation(msg.into()) }

  /// `true` for the lookup failures (`*NotFound`).
  pub fn is_not_found(&self) -> bool {
    matches!(
      self,
      Self::UserNotFound(_)
        | Self::PartyNotFound(_)
        | Self::InvitationNotFound(_)
        | Self::RequestNotFound(_)
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
