//! Store traits consumed by the API layer.
//!
//! Implemented by storage backends (e.g. `soiree-store-sqlite`). The three
//! traits mirror the three owners of state: the identity store owns users,
//! the relationship store owns friend edges and friend invitations, and the
//! party store owns parties, invitations and join requests.
//!
//! Every method that touches more than one row is a single atomic unit: an
//! implementation must either apply all of it or none of it. Rule violations
//! are reported as [`crate::Error`] somewhere in the returned error's source
//! chain.

use std::{collections::BTreeSet, future::Future};

use uuid::Uuid;

use crate::{
  lifecycle::Resolution,
  media::MediaRef,
  membership::{Departure, PartyInvitation, PartyRequest},
  party::{NewParty, Party, PartyQuery, PartyUpdate},
  relationship::{FriendInvitation, InvitationDirection},
  user::{Credentials, NewUser, User, UserQuery, UserUpdate},
};

/// Which pending membership rows to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipFilter {
  /// Everything pending against one party.
  Party(Uuid),
  /// Everything addressed to (invitations) or issued by (requests) one user.
  User(Uuid),
}

// ─── Identity ────────────────────────────────────────────────────────────────

pub trait IdentityStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a new user. Email and username uniqueness is enforced here and
  /// reported as [`crate::Error::Validation`].
  fn create_user(
    &self,
    input: NewUser,
    password_hash: String,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Retrieve a user by id. Returns `None` if not found.
  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Look up the credential record used for authentication.
  fn credentials_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Credentials>, Self::Error>> + Send + 'a;

  /// Substring search over username, first name and last name. Exact
  /// username matches sort first, then by username.
  fn find_users_by_text<'a>(
    &'a self,
    query: &'a UserQuery,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + 'a;

  fn update_user(
    &self,
    id: Uuid,
    update: UserUpdate,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Replace the avatar; returns the previous reference so the caller can
  /// release it.
  fn set_avatar(
    &self,
    id: Uuid,
    avatar: MediaRef,
  ) -> impl Future<Output = Result<MediaRef, Self::Error>> + Send + '_;

  /// Delete a user and everything that depends on it. Returns the media that
  /// the deleted rows referenced (avatar and owned party images); default
  /// media is never included.
  fn delete_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Vec<MediaRef>, Self::Error>> + Send + '_;
}

// ─── Relationships ───────────────────────────────────────────────────────────

pub trait RelationshipStore: IdentityStore {
  /// Insert both directed edges of `{a, b}`. Idempotent.
  fn add_friend(
    &self,
    a: Uuid,
    b: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Remove both directed edges. Returns whether a friendship existed.
  fn remove_friend(
    &self,
    a: Uuid,
    b: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn is_friend(
    &self,
    a: Uuid,
    b: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Friends of `user`, ordered by username.
  fn list_friends(
    &self,
    user: Uuid,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  fn friend_ids(
    &self,
    user: Uuid,
  ) -> impl Future<Output = Result<BTreeSet<Uuid>, Self::Error>> + Send + '_;

  /// Create a pending invitation. Fails on self-invites, on a pending
  /// invitation in either direction, and between existing friends.
  fn propose_invitation(
    &self,
    sender: Uuid,
    receiver: Uuid,
  ) -> impl Future<Output = Result<FriendInvitation, Self::Error>> + Send + '_;

  fn get_friend_invitation(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<FriendInvitation>, Self::Error>> + Send + '_;

  /// Oldest first.
  fn list_friend_invitations(
    &self,
    user: Uuid,
    direction: InvitationDirection,
  ) -> impl Future<Output = Result<Vec<FriendInvitation>, Self::Error>> + Send + '_;

  /// Promote the invitation to a friendship and delete it, atomically.
  fn accept_friend_invitation(
    &self,
    id: Uuid,
    actor: Uuid,
  ) -> impl Future<Output = Result<FriendInvitation, Self::Error>> + Send + '_;

  /// Reject (receiver) or cancel (sender) the invitation.
  fn discard_friend_invitation(
    &self,
    id: Uuid,
    actor: Uuid,
  ) -> impl Future<Output = Result<Resolution, Self::Error>> + Send + '_;
}

// ─── Parties ─────────────────────────────────────────────────────────────────

pub trait PartyStore: RelationshipStore {
  /// Create a party owned by `owner`, who becomes its first participant.
  fn create_party(
    &self,
    owner: Uuid,
    input: NewParty,
  ) -> impl Future<Output = Result<Party, Self::Error>> + Send + '_;

  fn get_party(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Party>, Self::Error>> + Send + '_;

  /// Candidate parties in creation order. No visibility filtering happens
  /// here.
  fn search_parties<'a>(
    &'a self,
    query: &'a PartyQuery,
  ) -> impl Future<Output = Result<Vec<Party>, Self::Error>> + Send + 'a;

  /// Owner-only update, validated against the merged result before commit.
  fn update_party(
    &self,
    id: Uuid,
    actor: Uuid,
    update: PartyUpdate,
  ) -> impl Future<Output = Result<Party, Self::Error>> + Send + '_;

  /// Owner-only; returns the previous image reference.
  fn set_party_image(
    &self,
    id: Uuid,
    actor: Uuid,
    image: MediaRef,
  ) -> impl Future<Output = Result<MediaRef, Self::Error>> + Send + '_;

  /// Remove `user` from the party. When `user` is the owner the party is
  /// deleted together with its invitations and requests.
  fn remove_participant(
    &self,
    id: Uuid,
    actor: Uuid,
    user: Uuid,
  ) -> impl Future<Output = Result<Departure, Self::Error>> + Send + '_;

  // ── Invitations ───────────────────────────────────────────────────────

  fn invite_to_party(
    &self,
    party_id: Uuid,
    issuer: Uuid,
    receiver: Uuid,
  ) -> impl Future<Output = Result<PartyInvitation, Self::Error>> + Send + '_;

  fn get_party_invitation(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<PartyInvitation>, Self::Error>> + Send + '_;

  fn list_party_invitations(
    &self,
    filter: MembershipFilter,
  ) -> impl Future<Output = Result<Vec<PartyInvitation>, Self::Error>> + Send + '_;

  /// Add the receiver to the participants and delete the invitation,
  /// atomically. Returns the updated party.
  fn accept_party_invitation(
    &self,
    id: Uuid,
    actor: Uuid,
  ) -> impl Future<Output = Result<Party, Self::Error>> + Send + '_;

  fn discard_party_invitation(
    &self,
    id: Uuid,
    actor: Uuid,
  ) -> impl Future<Output = Result<Resolution, Self::Error>> + Send + '_;

  // ── Requests ──────────────────────────────────────────────────────────

  /// Visibility is evaluated inside the same transaction as the insert.
  fn request_to_join(
    &self,
    party_id: Uuid,
    sender: Uuid,
  ) -> impl Future<Output = Result<PartyRequest, Self::Error>> + Send + '_;

  fn get_party_request(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<PartyRequest>, Self::Error>> + Send + '_;

  fn list_party_requests(
    &self,
    filter: MembershipFilter,
  ) -> impl Future<Output = Result<Vec<PartyRequest>, Self::Error>> + Send + '_;

  /// Owner-only. Adds the sender and deletes the request, atomically.
  fn accept_party_request(
    &self,
    id: Uuid,
    actor: Uuid,
  ) -> impl Future<Output = Result<Party, Self::Error>> + Send + '_;

  fn discard_party_request(
    &self,
    id: Uuid,
    actor: Uuid,
  ) -> impl Future<Output = Result<Resolution, Self::Error>> + Send + '_;
}
