//! Integration tests for `SqliteStore` against an in-memory database.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate, Utc};
use soiree_core::{
  Error as CoreError,
  lifecycle::Resolution,
  media::MediaRef,
  membership::Departure,
  party::{GeoFilter, GeoPoint, NewParty, PartyQuery, PartyUpdate, PrivacyTier, TimeWindow},
  relationship::InvitationDirection,
  store::{IdentityStore, MembershipFilter, PartyStore, RelationshipStore},
  user::{NewUser, User, UserQuery, UserUpdate},
  visibility::party_visible_to,
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn user(s: &SqliteStore, username: &str) -> User {
  s.create_user(
    NewUser {
      username:      username.into(),
      email:         format!("{username}@Example.com"),
      first_name:    username.to_uppercase(),
      last_name:     "Tester".into(),
      date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 17).unwrap(),
    },
    "$argon2id$fake".into(),
  )
  .await
  .unwrap()
}

fn new_party(privacy: PrivacyTier) -> NewParty {
  let start = Utc::now() + Duration::days(1);
  NewParty {
    name: "party name".into(),
    description: "description".into(),
    privacy,
    location: GeoPoint::new(12.0, 12.0).unwrap(),
    window: TimeWindow::new(start, start + Duration::hours(5)).unwrap(),
  }
}

/// The rule violation carried by a store error.
fn core(err: Error) -> CoreError {
  match err {
    Error::Core(e) => e,
    other => panic!("expected a rule violation, got {other}"),
  }
}

// ─── Identity ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_and_fetch_user() {
  let s = store().await;
  let alice = user(&s, "alice").await;

  assert_eq!(alice.email, "alice@example.com");
  assert!(alice.avatar.is_default());

  let fetched = s.get_user(alice.user_id).await.unwrap().unwrap();
  assert_eq!(fetched, alice);
  assert!(s.get_user(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_email_or_username_is_rejected() {
  let s = store().await;
  let alice = user(&s, "alice").await;

  let mut again = NewUser {
    username:      "alice2".into(),
    email:         "alice@EXAMPLE.com".into(),
    first_name:    String::new(),
    last_name:     String::new(),
    date_of_birth: alice.date_of_birth,
  };
  let err = s.create_user(again.clone(), "h".into()).await.unwrap_err();
  assert!(matches!(core(err), CoreError::Validation(_)));

  again.email = "other@example.com".into();
  again.username = "alice".into();
  let err = s.create_user(again, "h".into()).await.unwrap_err();
  assert!(matches!(core(err), CoreError::Validation(_)));
}

#[tokio::test]
async fn credentials_lookup_normalises_email() {
  let s = store().await;
  let alice = user(&s, "alice").await;

  let creds = s.credentials_by_email("alice@EXAMPLE.COM").await.unwrap().unwrap();
  assert_eq!(creds.user.user_id, alice.user_id);
  assert_eq!(creds.password_hash, "$argon2id$fake");
  assert!(s.credentials_by_email("nobody@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn text_search_puts_exact_username_first() {
  let s = store().await;
  user(&s, "annabel").await;
  user(&s, "ann").await;
  user(&s, "bob").await;

  let query = UserQuery { text: "ann".into(), ..Default::default() };
  let found = s.find_users_by_text(&query).await.unwrap();
  let names: Vec<_> = found.iter().map(|u| u.username.as_str()).collect();
  assert_eq!(names, ["ann", "annabel"]);

  let query = UserQuery { text: "ann".into(), limit: Some(1), offset: Some(1) };
  let page = s.find_users_by_text(&query).await.unwrap();
  assert_eq!(page.len(), 1);
  assert_eq!(page[0].username, "annabel");
}

#[tokio::test]
async fn update_user_keeps_untouched_fields() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;

  let updated = s
    .update_user(alice.user_id, UserUpdate {
      first_name: Some("Alicia".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(updated.first_name, "Alicia");
  assert_eq!(updated.username, "alice");
  assert_eq!(updated.email, alice.email);

  let err = s
    .update_user(alice.user_id, UserUpdate {
      username: Some(bob.username.clone()),
      ..Default::default()
    })
    .await
    .unwrap_err();
  assert!(matches!(core(err), CoreError::Validation(_)));
}

#[tokio::test]
async fn set_avatar_returns_previous() {
  let s = store().await;
  let alice = user(&s, "alice").await;

  let previous = s.set_avatar(alice.user_id, MediaRef::new("pfp/a.png")).await.unwrap();
  assert!(previous.is_default());
  let previous = s.set_avatar(alice.user_id, MediaRef::new("pfp/b.png")).await.unwrap();
  assert_eq!(previous.as_str(), "pfp/a.png");
}

#[tokio::test]
async fn delete_user_cascades() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let carol = user(&s, "carol").await;

  s.add_friend(alice.user_id, bob.user_id).await.unwrap();
  s.propose_invitation(alice.user_id, carol.user_id).await.unwrap();
  s.set_avatar(alice.user_id, MediaRef::new("pfp/alice.png")).await.unwrap();

  let party = s.create_party(alice.user_id, new_party(PrivacyTier::Public)).await.unwrap();
  s.set_party_image(party.party_id, alice.user_id, MediaRef::new("parties/p.png"))
    .await
    .unwrap();
  s.invite_to_party(party.party_id, alice.user_id, carol.user_id).await.unwrap();
  s.request_to_join(party.party_id, bob.user_id).await.unwrap();

  let other = s.create_party(bob.user_id, new_party(PrivacyTier::Public)).await.unwrap();
  s.request_to_join(other.party_id, alice.user_id).await.unwrap();

  let released = s.delete_user(alice.user_id).await.unwrap();
  let released: BTreeSet<_> = released.iter().map(MediaRef::as_str).collect();
  assert_eq!(released, BTreeSet::from(["pfp/alice.png", "parties/p.png"]));

  assert!(s.get_user(alice.user_id).await.unwrap().is_none());
  assert!(!s.is_friend(bob.user_id, alice.user_id).await.unwrap());
  assert!(s.list_friends(bob.user_id).await.unwrap().is_empty());
  assert!(
    s.list_friend_invitations(carol.user_id, InvitationDirection::Received)
      .await
      .unwrap()
      .is_empty()
  );
  assert!(s.get_party(party.party_id).await.unwrap().is_none());
  assert!(
    s.list_party_invitations(MembershipFilter::User(carol.user_id))
      .await
      .unwrap()
      .is_empty()
  );
  assert!(
    s.list_party_requests(MembershipFilter::Party(other.party_id))
      .await
      .unwrap()
      .is_empty()
  );
}

// ─── Friendships ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn friendship_is_symmetric() {
  let s = store().await;
  let a = user(&s, "a").await;
  let b = user(&s, "b").await;

  s.add_friend(a.user_id, b.user_id).await.unwrap();
  assert!(s.is_friend(a.user_id, b.user_id).await.unwrap());
  assert!(s.is_friend(b.user_id, a.user_id).await.unwrap());
  assert_eq!(s.friend_ids(b.user_id).await.unwrap(), BTreeSet::from([a.user_id]));

  // Idempotent.
  s.add_friend(b.user_id, a.user_id).await.unwrap();
  assert_eq!(s.list_friends(a.user_id).await.unwrap().len(), 1);

  assert!(s.remove_friend(b.user_id, a.user_id).await.unwrap());
  assert!(!s.is_friend(a.user_id, b.user_id).await.unwrap());
  assert!(!s.is_friend(b.user_id, a.user_id).await.unwrap());
  assert!(!s.remove_friend(a.user_id, b.user_id).await.unwrap());
}

#[tokio::test]
async fn self_friendship_is_rejected() {
  let s = store().await;
  let a = user(&s, "a").await;

  let err = s.add_friend(a.user_id, a.user_id).await.unwrap_err();
  assert_eq!(core(err), CoreError::SelfReference);
  let err = s.propose_invitation(a.user_id, a.user_id).await.unwrap_err();
  assert_eq!(core(err), CoreError::SelfReference);
}

#[tokio::test]
async fn opposite_direction_invitation_is_a_duplicate() {
  let s = store().await;
  let a = user(&s, "a").await;
  let b = user(&s, "b").await;

  s.propose_invitation(a.user_id, b.user_id).await.unwrap();
  let err = s.propose_invitation(b.user_id, a.user_id).await.unwrap_err();
  assert_eq!(core(err), CoreError::DuplicateInvitation);
  let err = s.propose_invitation(a.user_id, b.user_id).await.unwrap_err();
  assert_eq!(core(err), CoreError::DuplicateInvitation);
}

#[tokio::test]
async fn inviting_a_friend_or_a_stranger_id_fails() {
  let s = store().await;
  let a = user(&s, "a").await;
  let b = user(&s, "b").await;

  s.add_friend(a.user_id, b.user_id).await.unwrap();
  let err = s.propose_invitation(a.user_id, b.user_id).await.unwrap_err();
  assert_eq!(core(err), CoreError::AlreadyFriends);

  let ghost = Uuid::new_v4();
  let err = s.propose_invitation(a.user_id, ghost).await.unwrap_err();
  assert_eq!(core(err), CoreError::UserNotFound(ghost));
}

#[tokio::test]
async fn accepting_creates_edge_and_clears_invitation() {
  let s = store().await;
  let a = user(&s, "a").await;
  let b = user(&s, "b").await;

  let inv = s.propose_invitation(a.user_id, b.user_id).await.unwrap();
  assert_eq!(
    s.list_friend_invitations(a.user_id, InvitationDirection::Sent).await.unwrap(),
    vec![inv.clone()]
  );

  let err = s.accept_friend_invitation(inv.invitation_id, a.user_id).await.unwrap_err();
  assert!(matches!(core(err), CoreError::PermissionDenied(_)));
  assert!(!s.is_friend(a.user_id, b.user_id).await.unwrap());

  s.accept_friend_invitation(inv.invitation_id, b.user_id).await.unwrap();
  assert!(s.is_friend(a.user_id, b.user_id).await.unwrap());
  assert!(s.is_friend(b.user_id, a.user_id).await.unwrap());
  assert!(s.get_friend_invitation(inv.invitation_id).await.unwrap().is_none());
  for user in [a.user_id, b.user_id] {
    for direction in [InvitationDirection::Sent, InvitationDirection::Received] {
      assert!(s.list_friend_invitations(user, direction).await.unwrap().is_empty());
    }
  }
}

#[tokio::test]
async fn discarding_reports_who_acted() {
  let s = store().await;
  let a = user(&s, "a").await;
  let b = user(&s, "b").await;
  let c = user(&s, "c").await;

  let inv = s.propose_invitation(a.user_id, b.user_id).await.unwrap();
  let err = s.discard_friend_invitation(inv.invitation_id, c.user_id).await.unwrap_err();
  assert!(matches!(core(err), CoreError::PermissionDenied(_)));
  assert_eq!(
    s.discard_friend_invitation(inv.invitation_id, b.user_id).await.unwrap(),
    Resolution::Rejected
  );

  let inv = s.propose_invitation(a.user_id, b.user_id).await.unwrap();
  assert_eq!(
    s.discard_friend_invitation(inv.invitation_id, a.user_id).await.unwrap(),
    Resolution::Cancelled
  );
  let err = s.discard_friend_invitation(inv.invitation_id, a.user_id).await.unwrap_err();
  assert_eq!(core(err), CoreError::InvitationNotFound(inv.invitation_id));
  assert!(!s.is_friend(a.user_id, b.user_id).await.unwrap());
}

// ─── Visibility ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn secret_party_becomes_visible_on_join() {
  let s = store().await;
  let owner = user(&s, "owner").await;
  let guest = user(&s, "guest").await;
  s.add_friend(owner.user_id, guest.user_id).await.unwrap();

  let party = s.create_party(owner.user_id, new_party(PrivacyTier::Secret)).await.unwrap();
  assert!(!party_visible_to(&s, &party, guest.user_id).await.unwrap());
  assert!(party_visible_to(&s, &party, owner.user_id).await.unwrap());

  let inv = s.invite_to_party(party.party_id, owner.user_id, guest.user_id).await.unwrap();
  let party = s.accept_party_invitation(inv.invitation_id, guest.user_id).await.unwrap();
  assert!(party_visible_to(&s, &party, guest.user_id).await.unwrap());
}

#[tokio::test]
async fn private_party_follows_friendship() {
  let s = store().await;
  let owner = user(&s, "owner").await;
  let guest = user(&s, "guest").await;

  let party = s.create_party(owner.user_id, new_party(PrivacyTier::Private)).await.unwrap();
  assert!(!party_visible_to(&s, &party, guest.user_id).await.unwrap());

  s.add_friend(owner.user_id, guest.user_id).await.unwrap();
  assert!(party_visible_to(&s, &party, guest.user_id).await.unwrap());

  s.remove_friend(guest.user_id, owner.user_id).await.unwrap();
  assert!(!party_visible_to(&s, &party, guest.user_id).await.unwrap());
}

// ─── Parties ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_party_makes_owner_a_participant() {
  let s = store().await;
  let owner = user(&s, "owner").await;

  let party = s.create_party(owner.user_id, new_party(PrivacyTier::Private)).await.unwrap();
  assert_eq!(party.participants, BTreeSet::from([owner.user_id]));
  assert!(party.image.is_default());

  let fetched = s.get_party(party.party_id).await.unwrap().unwrap();
  assert_eq!(fetched, party);
}

#[tokio::test]
async fn invalid_party_is_rejected() {
  let s = store().await;
  let owner = user(&s, "owner").await;

  let mut input = new_party(PrivacyTier::Public);
  input.name = "x".repeat(101);
  let err = s.create_party(owner.user_id, input).await.unwrap_err();
  assert!(matches!(core(err), CoreError::Validation(_)));
}

#[tokio::test]
async fn search_filters_by_text_owner_and_distance() {
  let s = store().await;
  let owner = user(&s, "owner").await;
  let other = user(&s, "other").await;

  let mut near = new_party(PrivacyTier::Public);
  near.name = "Rooftop drinks".into();
  let near = s.create_party(owner.user_id, near).await.unwrap();

  let mut far = new_party(PrivacyTier::Public);
  far.location = GeoPoint::new(12.0, 12.2).unwrap();
  let far = s.create_party(other.user_id, far).await.unwrap();

  let all = s.search_parties(&PartyQuery::default()).await.unwrap();
  assert_eq!(all.iter().map(|p| p.party_id).collect::<Vec<_>>(), [near.party_id, far.party_id]);

  let text = PartyQuery { text: Some("rooftop".into()), ..Default::default() };
  assert_eq!(s.search_parties(&text).await.unwrap(), vec![near.clone()]);

  let mine = PartyQuery { owner: Some(other.user_id), ..Default::default() };
  assert_eq!(s.search_parties(&mine).await.unwrap(), vec![far.clone()]);

  // ~21.8 km apart on the 12th parallel.
  let around = |radius_m| PartyQuery {
    near: Some(GeoFilter { center: GeoPoint::new(12.0, 12.0).unwrap(), radius_m }),
    ..Default::default()
  };
  assert_eq!(s.search_parties(&around(10_000.0)).await.unwrap(), vec![near.clone()]);
  assert_eq!(s.search_parties(&around(25_000.0)).await.unwrap().len(), 2);
}

#[tokio::test]
async fn search_across_the_antimeridian() {
  let s = store().await;
  let owner = user(&s, "owner").await;

  let mut input = new_party(PrivacyTier::Public);
  input.location = GeoPoint::new(0.0, -179.99).unwrap();
  let party = s.create_party(owner.user_id, input).await.unwrap();

  let query = PartyQuery {
    near: Some(GeoFilter { center: GeoPoint::new(0.0, 179.99).unwrap(), radius_m: 5_000.0 }),
    ..Default::default()
  };
  assert_eq!(s.search_parties(&query).await.unwrap(), vec![party]);
}

#[tokio::test]
async fn request_to_join_scenario() {
  let s = store().await;
  let owner = user(&s, "owner").await;
  let guest = user(&s, "guest").await;

  let party = s.create_party(owner.user_id, new_party(PrivacyTier::Private)).await.unwrap();
  let err = s.request_to_join(party.party_id, guest.user_id).await.unwrap_err();
  assert!(matches!(core(err), CoreError::PermissionDenied(_)));

  s.add_friend(owner.user_id, guest.user_id).await.unwrap();
  let req = s.request_to_join(party.party_id, guest.user_id).await.unwrap();
  let err = s.request_to_join(party.party_id, guest.user_id).await.unwrap_err();
  assert_eq!(core(err), CoreError::DuplicateInvitation);

  let err = s.accept_party_request(req.request_id, guest.user_id).await.unwrap_err();
  assert!(matches!(core(err), CoreError::PermissionDenied(_)));

  let party = s.accept_party_request(req.request_id, owner.user_id).await.unwrap();
  assert!(party.is_participant(guest.user_id));
  assert!(s.get_party_request(req.request_id).await.unwrap().is_none());

  let err = s.request_to_join(party.party_id, guest.user_id).await.unwrap_err();
  assert_eq!(core(err), CoreError::AlreadyParticipant(guest.user_id));
}

#[tokio::test]
async fn wrong_actor_accept_changes_nothing() {
  let s = store().await;
  let owner = user(&s, "owner").await;
  let guest = user(&s, "guest").await;
  let intruder = user(&s, "intruder").await;

  let party = s.create_party(owner.user_id, new_party(PrivacyTier::Public)).await.unwrap();
  let inv = s.invite_to_party(party.party_id, owner.user_id, guest.user_id).await.unwrap();

  for actor in [intruder.user_id, owner.user_id] {
    let err = s.accept_party_invitation(inv.invitation_id, actor).await.unwrap_err();
    assert!(matches!(core(err), CoreError::PermissionDenied(_)));
  }

  let party = s.get_party(party.party_id).await.unwrap().unwrap();
  assert_eq!(party.participants, BTreeSet::from([owner.user_id]));
  assert_eq!(s.get_party_invitation(inv.invitation_id).await.unwrap(), Some(inv));
}

#[tokio::test]
async fn accepting_an_invitation_clears_a_pending_request() {
  let s = store().await;
  let owner = user(&s, "owner").await;
  let guest = user(&s, "guest").await;

  let party = s.create_party(owner.user_id, new_party(PrivacyTier::Public)).await.unwrap();
  let req = s.request_to_join(party.party_id, guest.user_id).await.unwrap();
  let inv = s.invite_to_party(party.party_id, owner.user_id, guest.user_id).await.unwrap();

  s.accept_party_invitation(inv.invitation_id, guest.user_id).await.unwrap();
  assert!(s.get_party_request(req.request_id).await.unwrap().is_none());
  assert!(
    s.list_party_invitations(MembershipFilter::Party(party.party_id))
      .await
      .unwrap()
      .is_empty()
  );
}

#[tokio::test]
async fn party_invitation_rules() {
  let s = store().await;
  let owner = user(&s, "owner").await;
  let guest = user(&s, "guest").await;

  let party = s.create_party(owner.user_id, new_party(PrivacyTier::Public)).await.unwrap();

  let err = s.invite_to_party(party.party_id, guest.user_id, guest.user_id).await.unwrap_err();
  assert!(matches!(core(err), CoreError::PermissionDenied(_)));
  let err = s.invite_to_party(party.party_id, owner.user_id, owner.user_id).await.unwrap_err();
  assert_eq!(core(err), CoreError::AlreadyParticipant(owner.user_id));
  let ghost = Uuid::new_v4();
  let err = s.invite_to_party(party.party_id, owner.user_id, ghost).await.unwrap_err();
  assert_eq!(core(err), CoreError::UserNotFound(ghost));

  let inv = s.invite_to_party(party.party_id, owner.user_id, guest.user_id).await.unwrap();
  let err = s.invite_to_party(party.party_id, owner.user_id, guest.user_id).await.unwrap_err();
  assert_eq!(core(err), CoreError::DuplicateInvitation);
  assert_eq!(
    s.list_party_invitations(MembershipFilter::User(guest.user_id)).await.unwrap(),
    vec![inv.clone()]
  );

  assert_eq!(
    s.discard_party_invitation(inv.invitation_id, guest.user_id).await.unwrap(),
    Resolution::Rejected
  );
  let inv = s.invite_to_party(party.party_id, owner.user_id, guest.user_id).await.unwrap();
  assert_eq!(
    s.discard_party_invitation(inv.invitation_id, owner.user_id).await.unwrap(),
    Resolution::Cancelled
  );
}

#[tokio::test]
async fn party_delete_leaves_no_orphans() {
  let s = store().await;
  let owner = user(&s, "owner").await;
  let invited = user(&s, "invited").await;
  let requester = user(&s, "requester").await;
  let member = user(&s, "member").await;

  let party = s.create_party(owner.user_id, new_party(PrivacyTier::Public)).await.unwrap();
  s.invite_to_party(party.party_id, owner.user_id, invited.user_id).await.unwrap();
  s.request_to_join(party.party_id, requester.user_id).await.unwrap();
  let inv = s.invite_to_party(party.party_id, owner.user_id, member.user_id).await.unwrap();
  s.accept_party_invitation(inv.invitation_id, member.user_id).await.unwrap();

  let err = s
    .remove_participant(party.party_id, member.user_id, owner.user_id)
    .await
    .unwrap_err();
  assert!(matches!(core(err), CoreError::PermissionDenied(_)));

  let departure = s
    .remove_participant(party.party_id, owner.user_id, owner.user_id)
    .await
    .unwrap();
  assert_eq!(departure, Departure::PartyDeleted { image: party.image.clone() });

  assert!(s.get_party(party.party_id).await.unwrap().is_none());
  assert!(
    s.list_party_invitations(MembershipFilter::User(invited.user_id))
      .await
      .unwrap()
      .is_empty()
  );
  assert!(
    s.list_party_requests(MembershipFilter::User(requester.user_id))
      .await
      .unwrap()
      .is_empty()
  );
  let participating = PartyQuery { participant: Some(member.user_id), ..Default::default() };
  assert!(s.search_parties(&participating).await.unwrap().is_empty());
}

#[tokio::test]
async fn participant_leaves_and_owner_removes() {
  let s = store().await;
  let owner = user(&s, "owner").await;
  let a = user(&s, "a").await;
  let b = user(&s, "b").await;

  let party = s.create_party(owner.user_id, new_party(PrivacyTier::Public)).await.unwrap();
  for guest in [a.user_id, b.user_id] {
    let req = s.request_to_join(party.party_id, guest).await.unwrap();
    s.accept_party_request(req.request_id, owner.user_id).await.unwrap();
  }

  let err = s.remove_participant(party.party_id, a.user_id, b.user_id).await.unwrap_err();
  assert!(matches!(core(err), CoreError::PermissionDenied(_)));

  assert_eq!(
    s.remove_participant(party.party_id, a.user_id, a.user_id).await.unwrap(),
    Departure::Left
  );
  assert_eq!(
    s.remove_participant(party.party_id, owner.user_id, b.user_id).await.unwrap(),
    Departure::Left
  );
  let err = s.remove_participant(party.party_id, a.user_id, a.user_id).await.unwrap_err();
  assert_eq!(core(err), CoreError::NotParticipant(a.user_id));

  let party = s.get_party(party.party_id).await.unwrap().unwrap();
  assert_eq!(party.participants, BTreeSet::from([owner.user_id]));
}

#[tokio::test]
async fn update_dropping_owner_is_rejected_before_commit() {
  let s = store().await;
  let owner = user(&s, "owner").await;
  let guest = user(&s, "guest").await;

  let party = s.create_party(owner.user_id, new_party(PrivacyTier::Public)).await.unwrap();
  let req = s.request_to_join(party.party_id, guest.user_id).await.unwrap();
  let party = s.accept_party_request(req.request_id, owner.user_id).await.unwrap();

  let update = PartyUpdate {
    name: Some("renamed".into()),
    participants: Some(BTreeSet::from([guest.user_id])),
    ..Default::default()
  };
  let err = s.update_party(party.party_id, owner.user_id, update).await.unwrap_err();
  assert!(matches!(core(err), CoreError::Validation(_)));

  let unchanged = s.get_party(party.party_id).await.unwrap().unwrap();
  assert_eq!(unchanged, party);
}

#[tokio::test]
async fn owner_update_applies_and_removes_participants() {
  let s = store().await;
  let owner = user(&s, "owner").await;
  let guest = user(&s, "guest").await;

  let party = s.create_party(owner.user_id, new_party(PrivacyTier::Public)).await.unwrap();
  let req = s.request_to_join(party.party_id, guest.user_id).await.unwrap();
  s.accept_party_request(req.request_id, owner.user_id).await.unwrap();

  let err = s
    .update_party(party.party_id, guest.user_id, PartyUpdate::default())
    .await
    .unwrap_err();
  assert!(matches!(core(err), CoreError::PermissionDenied(_)));

  let updated = s
    .update_party(party.party_id, owner.user_id, PartyUpdate {
      privacy: Some(PrivacyTier::Secret),
      participants: Some(BTreeSet::from([owner.user_id])),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(updated.privacy, PrivacyTier::Secret);
  assert_eq!(updated.participants, BTreeSet::from([owner.user_id]));
  assert_eq!(s.get_party(party.party_id).await.unwrap().unwrap(), updated);
}

#[tokio::test]
async fn only_owner_sets_party_image() {
  let s = store().await;
  let owner = user(&s, "owner").await;
  let guest = user(&s, "guest").await;

  let party = s.create_party(owner.user_id, new_party(PrivacyTier::Public)).await.unwrap();
  let err = s
    .set_party_image(party.party_id, guest.user_id, MediaRef::new("parties/x.png"))
    .await
    .unwrap_err();
  assert!(matches!(core(err), CoreError::PermissionDenied(_)));

  let previous = s
    .set_party_image(party.party_id, owner.user_id, MediaRef::new("parties/x.png"))
    .await
    .unwrap();
  assert!(previous.is_default());
}

#[tokio::test]
async fn missing_rows_are_not_found() {
  let s = store().await;
  let owner = user(&s, "owner").await;
  let id = Uuid::new_v4();

  let err = s.accept_party_invitation(id, owner.user_id).await.unwrap_err();
  assert_eq!(core(err), CoreError::InvitationNotFound(id));
  let err = s.accept_party_request(id, owner.user_id).await.unwrap_err();
  assert_eq!(core(err), CoreError::RequestNotFound(id));
  let err = s.request_to_join(id, owner.user_id).await.unwrap_err();
  assert_eq!(core(err), CoreError::PartyNotFound(id));
}
