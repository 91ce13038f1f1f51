//! Handlers for party invitations and join requests.
//!
//! | Method | Path | Who |
//! |--------|------|-----|
//! | `GET`/`POST` | `/parties/{id}/invitations` | Owner lists / invites |
//! | `POST`   | `/parties/{id}/invitations/{invitation_id}/accept` | Receiver |
//! | `DELETE` | `/parties/{id}/invitations/{invitation_id}` | Receiver declines, owner cancels |
//! | `GET`    | `/parties/{id}/requests` | Owner |
//! | `POST`   | `/parties/{id}/requests` | Anyone who can see the party |
//! | `POST`   | `/parties/{id}/requests/{request_id}/accept` | Owner |
//! | `DELETE` | `/parties/{id}/requests/{request_id}` | Owner declines, sender cancels |
//! | `GET`    | `/me/party-invitations` | Received by the caller |
//! | `GET`    | `/me/party-requests` | Sent by the caller |
//!
//! An invitation or request addressed through the wrong party's path is
//! reported as not found.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use soiree_core::{
  Error as RuleError,
  media::MediaStore,
  membership::{PartyInvitation, PartyRequest, check_owner},
  store::{MembershipFilter, PartyStore},
};
use uuid::Uuid;

use crate::{
  AppState, Principal,
  error::ApiError,
  parties::load,
  views::{PartyInvitationView, PartyRequestView, PartyView, many},
};

async fn invitation_in<S: PartyStore>(
  store: &S,
  party_id: Uuid,
  id: Uuid,
) -> Result<PartyInvitation, ApiError> {
  store
    .get_party_invitation(id)
    .await
    .map_err(ApiError::store)?
    .filter(|i| i.party_id == party_id)
    .ok_or_else(|| RuleError::InvitationNotFound(id).into())
}

async fn request_in<S: PartyStore>(
  store: &S,
  party_id: Uuid,
  id: Uuid,
) -> Result<PartyRequest, ApiError> {
  store
    .get_party_request(id)
    .await
    .map_err(ApiError::store)?
    .filter(|r| r.party_id == party_id)
    .ok_or_else(|| RuleError::RequestNotFound(id).into())
}

// ─── Invitations ─────────────────────────────────────────────────────────────

/// `GET /parties/{id}/invitations`
pub async fn list_invitations<S, M>(
  State(state): State<AppState<S, M>>,
  Principal(user): Principal,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<PartyInvitationView>>, ApiError>
where
  S: PartyStore + 'static,
  M: MediaStore + 'static,
{
  let party = load(&*state.store, id).await?;
  check_owner(&party, user.user_id)?;

  let invitations = state
    .store
    .list_party_invitations(MembershipFilter::Party(id))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(many(invitations)))
}

#[derive(Debug, Deserialize)]
pub struct InviteBody {
  pub receiver_id: Uuid,
}

/// `POST /parties/{id}/invitations`
pub async fn invite<S, M>(
  State(state): State<AppState<S, M>>,
  Principal(user): Principal,
  Path(id): Path<Uuid>,
  Json(body): Json<InviteBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: PartyStore + 'static,
  M: MediaStore + 'static,
{
  let invitation = state
    .store
    .invite_to_party(id, user.user_id, body.receiver_id)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(PartyInvitationView::from(invitation))))
}

/// `POST /parties/{id}/invitations/{invitation_id}/accept`
pub async fn accept_invitation<S, M>(
  State(state): State<AppState<S, M>>,
  Principal(user): Principal,
  Path((id, invitation_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError>
where
  S: PartyStore + 'static,
  M: MediaStore + 'static,
{
  invitation_in(&*state.store, id, invitation_id).await?;
  let party = state
    .store
    .accept_party_invitation(invitation_id, user.user_id)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(party_id = %id, user_id = %user.user_id, "joined party by invitation");
  Ok((StatusCode::CREATED, Json(PartyView::from(party))))
}

/// `DELETE /parties/{id}/invitations/{invitation_id}`
pub async fn discard_invitation<S, M>(
  State(state): State<AppState<S, M>>,
  Principal(user): Principal,
  Path((id, invitation_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError>
where
  S: PartyStore + 'static,
  M: MediaStore + 'static,
{
  invitation_in(&*state.store, id, invitation_id).await?;
  let resolution = state
    .store
    .discard_party_invitation(invitation_id, user.user_id)
    .await
    .map_err(ApiError::store)?;
  tracing::debug!(%invitation_id, ?resolution, "party invitation discarded");
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /me/party-invitations`
pub async fn my_invitations<S, M>(
  State(state): State<AppState<S, M>>,
  Principal(user): Principal,
) -> Result<Json<Vec<PartyInvitationView>>, ApiError>
where
  S: PartyStore + 'static,
  M: MediaStore + 'static,
{
  let invitations = state
    .store
    .list_party_invitations(MembershipFilter::User(user.user_id))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(many(invitations)))
}

// ─── Requests ────────────────────────────────────────────────────────────────

/// `GET /parties/{id}/requests`
pub async fn list_requests<S, M>(
  State(state): State<AppState<S, M>>,
  Principal(user): Principal,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<PartyRequestView>>, ApiError>
where
  S: PartyStore + 'static,
  M: MediaStore + 'static,
{
  let party = load(&*state.store, id).await?;
  check_owner(&party, user.user_id)?;

  let requests = state
    .store
    .list_party_requests(MembershipFilter::Party(id))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(many(requests)))
}

/// `POST /parties/{id}/requests`
pub async fn request<S, M>(
  State(state): State<AppState<S, M>>,
  Principal(user): Principal,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
  S: PartyStore + 'static,
  M: MediaStore + 'static,
{
  let request = state
    .store
    .request_to_join(id, user.user_id)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(PartyRequestView::from(request))))
}

/// `POST /parties/{id}/requests/{request_id}/accept`
pub async fn accept_request<S, M>(
  State(state): State<AppState<S, M>>,
  Principal(user): Principal,
  Path((id, request_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError>
where
  S: PartyStore + 'static,
  M: MediaStore + 'static,
{
  let request = request_in(&*state.store, id, request_id).await?;
  let party = state
    .store
    .accept_party_request(request_id, user.user_id)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(party_id = %id, user_id = %request.sender, "join request accepted");
  Ok((StatusCode::CREATED, Json(PartyView::from(party))))
}

/// `DELETE /parties/{id}/requests/{request_id}`
pub async fn discard_request<S, M>(
  State(state): State<AppState<S, M>>,
  Principal(user): Principal,
  Path((id, request_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError>
where
  S: PartyStore + 'static,
  M: MediaStore + 'static,
{
  request_in(&*state.store, id, request_id).await?;
  let resolution = state
    .store
    .discard_party_request(request_id, user.user_id)
    .await
    .map_err(ApiError::store)?;
  tracing::debug!(%request_id, ?resolution, "party request discarded");
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /me/party-requests`
pub async fn my_requests<S, M>(
  State(state): State<AppState<S, M>>,
  Principal(user): Principal,
) -> Result<Json<Vec<PartyRequestView>>, ApiError>
where
  S: PartyStore + 'static,
  M: MediaStore + 'static,
{
  let requests = state
    .store
    .list_party_requests(MembershipFilter::User(user.user_id))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(many(requests)))
}
