//! Party visibility.
//!
//! [`can_see`] gates retrieval, listing, join requests and deletion
//! eligibility. It is a pure function: the friendship bit is looked up by the
//! caller against current store state on every evaluation.

use std::collections::BTreeSet;

use uuid::Uuid;

use crate::{
  party::{Party, PrivacyTier},
  store::RelationshipStore,
};

/// Whether `viewer` may see `party`.
///
/// `viewer_is_friend_of_owner` is only consulted for
/// [`PrivacyTier::Private`] parties; callers may pass `false` for other tiers
/// without looking it up (see [`PrivacyTier::needs_friendship`]).
pub fn can_see(party: &Party, viewer: Uuid, viewer_is_friend_of_owner: bool) -> bool {
  if party.is_owner(viewer) {
    return true;
  }
  match party.privacy {
    PrivacyTier::Public => true,
    PrivacyTier::Private => viewer_is_friend_of_owner,
    PrivacyTier::Secret => party.is_participant(viewer),
  }
}

/// [`can_see`] against current store state. The friendship lookup only
/// happens for private parties viewed by someone other than the owner.
pub async fn party_visible_to<S: RelationshipStore>(
  store: &S,
  party: &Party,
  viewer: Uuid,
) -> Result<bool, S::Error> {
  let friend = if party.privacy.needs_friendship() && !party.is_owner(viewer) {
    store.is_friend(party.owner, viewer).await?
  } else {
    false
  };
  Ok(can_see(party, viewer, friend))
}

/// Post-filter a candidate list down to what `viewer` may see, given the
/// viewer's full friend set.
pub fn retain_visible(parties: &mut Vec<Party>, viewer: Uuid, friends: &BTreeSet<Uuid>) {
  parties.retain(|p| can_see(p, viewer, friends.contains(&p.owner)));
}
