//! Handlers for `/friends` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/friends` | Caller's friends, by username |
//! | `DELETE` | `/friends/{user_id}` | 400 if not friends |
//! | `GET`    | `/friends/invitations` | Received |
//! | `GET`    | `/friends/invitations/sent` | Sent |
//! | `POST`   | `/friends/invitations` | Body: `{"receiver_id":"<uuid>"}` |
//! | `POST`   | `/friends/invitations/{id}/accept` | Receiver only |
//! | `DELETE` | `/friends/invitations/{id}` | Receiver rejects, sender cancels |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use soiree_core::{
  media::MediaStore,
  relationship::InvitationDirection,
  store::{PartyStore, RelationshipStore},
};
use uuid::Uuid;

use crate::{
  AppState, Principal,
  error::ApiError,
  views::{FriendInvitationView, ProfileView, many},
};

/// `GET /friends`
pub async fn list<S, M>(
  State(state): State<AppState<S, M>>,
  Principal(user): Principal,
) -> Result<Json<Vec<ProfileView>>, ApiError>
where
  S: PartyStore + 'static,
  M: MediaStore + 'static,
{
  let friends = state
    .store
    .list_friends(user.user_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(many(friends)))
}

/// `DELETE /friends/{user_id}`
pub async fn unfriend<S, M>(
  State(state): State<AppState<S, M>>,
  Principal(user): Principal,
  Path(friend_id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: PartyStore + 'static,
  M: MediaStore + 'static,
{
  let removed = state
    .store
    .remove_friend(user.user_id, friend_id)
    .await
    .map_err(ApiError::store)?;
  if !removed {
    return Err(ApiError::BadRequest(format!("user {friend_id} is not your friend")));
  }
  tracing::info!(user_id = %user.user_id, %friend_id, "removed friend");
  Ok(StatusCode::NO_CONTENT)
}

async fn invitations<S: RelationshipStore>(
  store: &S,
  user: Uuid,
  direction: InvitationDirection,
) -> Result<Json<Vec<FriendInvitationView>>, ApiError> {
  let invitations = store
    .list_friend_invitations(user, direction)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(many(invitations)))
}

/// `GET /friends/invitations`
pub async fn received<S, M>(
  State(state): State<AppState<S, M>>,
  Principal(user): Principal,
) -> Result<Json<Vec<FriendInvitationView>>, ApiError>
where
  S: PartyStore + 'static,
  M: MediaStore + 'static,
{
  invitations(&*state.store, user.user_id, InvitationDirection::Received).await
}

/// `GET /friends/invitations/sent`
pub async fn sent<S, M>(
  State(state): State<AppState<S, M>>,
  Principal(user): Principal,
) -> Result<Json<Vec<FriendInvitationView>>, ApiError>
where
  S: PartyStore + 'static,
  M: MediaStore + 'static,
{
  invitations(&*state.store, user.user_id, InvitationDirection::Sent).await
}

#[derive(Debug, Deserialize)]
pub struct InviteBody {
  pub receiver_id: Uuid,
}

/// `POST /friends/invitations`
pub async fn invite<S, M>(
  State(state): State<AppState<S, M>>,
  Principal(user): Principal,
  Json(body): Json<InviteBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: PartyStore + 'static,
  M: MediaStore + 'static,
{
  let invitation = state
    .store
    .propose_invitation(user.user_id, body.receiver_id)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(FriendInvitationView::from(invitation))))
}

/// `POST /friends/invitations/{id}/accept`; responds with the new friend's
/// profile.
pub async fn accept<S, M>(
  State(state): State<AppState<S, M>>,
  Principal(user): Principal,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
  S: PartyStore + 'static,
  M: MediaStore + 'static,
{
  let invitation = state
    .store
    .accept_friend_invitation(id, user.user_id)
    .await
    .map_err(ApiError::store)?;

  let friend = state
    .store
    .get_user(invitation.sender)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("user {} not found", invitation.sender)))?;
  Ok((StatusCode::CREATED, Json(ProfileView::from(friend))))
}

/// `DELETE /friends/invitations/{id}`
pub async fn discard<S, M>(
  State(state): State<AppState<S, M>>,
  Principal(user): Principal,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: PartyStore + 'static,
  M: MediaStore + 'static,
{
  let resolution = state
    .store
    .discard_friend_invitation(id, user.user_id)
    .await
    .map_err(ApiError::store)?;
  tracing::debug!(invitation_id = %id, ?resolution, "friend invitation discarded");
  Ok(StatusCode::NO_CONTENT)
}
