//! Handlers for `/parties` endpoints.
//!
//! `GET /parties` post-filters store candidates through [`retain_visible`]
//! before paginating, so `limit`/`offset` count visible parties only. The
//! caller's own and participating lists are not filtered.

use std::collections::BTreeSet;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use soiree_core::{
  Error as RuleError,
  media::{MediaKind, MediaStore},
  membership::{Departure, check_owner},
  party::{GeoFilter, GeoPoint, NewParty, Party, PartyQuery, PartyUpdate, PrivacyTier, TimeWindow},
  store::PartyStore,
  visibility::{party_visible_to, retain_visible},
};
use uuid::Uuid;

use crate::{
  AppState, Principal,
  error::ApiError,
  media,
  views::{PartyView, many},
};

/// Load a party or fail with a 404.
pub(crate) async fn load<S: PartyStore>(store: &S, id: Uuid) -> Result<Party, ApiError> {
  store
    .get_party(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| RuleError::PartyNotFound(id).into())
}

fn paginate(parties: Vec<Party>, limit: Option<usize>, offset: Option<usize>) -> Vec<PartyView> {
  let page = parties
    .into_iter()
    .skip(offset.unwrap_or(0))
    .take(limit.unwrap_or(usize::MAX))
    .collect();
  many(page)
}

/// Run `query`, drop what `viewer` may not see and apply pagination.
async fn visible<S: PartyStore>(
  store: &S,
  viewer: Uuid,
  query: &PartyQuery,
  limit: Option<usize>,
  offset: Option<usize>,
) -> Result<Vec<PartyView>, ApiError> {
  let mut parties = store.search_parties(query).await.map_err(ApiError::store)?;
  let friends = store.friend_ids(viewer).await.map_err(ApiError::store)?;
  retain_visible(&mut parties, viewer, &friends);
  Ok(paginate(parties, limit, offset))
}

// ─── Listing ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  /// Substring over name and description.
  pub search: Option<String>,
  pub lat:    Option<f64>,
  pub lon:    Option<f64>,
  /// Radius in metres around (`lat`, `lon`).
  pub range:  Option<f64>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

impl ListParams {
  fn near(&self) -> Result<Option<GeoFilter>, ApiError> {
    let Some(range) = self.range else {
      return Ok(None);
    };
    let (Some(lat), Some(lon)) = (self.lat, self.lon) else {
      return Err(ApiError::BadRequest("point is missing".into()));
    };
    if !range.is_finite() || range < 0.0 {
      return Err(ApiError::BadRequest(format!("range {range} must be a non-negative number")));
    }
    Ok(Some(GeoFilter { center: GeoPoint::new(lat, lon)?, radius_m: range }))
  }
}

/// `GET /parties?search=&lat=&lon=&range=&limit=&offset=`
pub async fn list<S, M>(
  State(state): State<AppState<S, M>>,
  Principal(user): Principal,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<PartyView>>, ApiError>
where
  S: PartyStore + 'static,
  M: MediaStore + 'static,
{
  let query = PartyQuery {
    text: params.search.clone().filter(|s| !s.is_empty()),
    near: params.near()?,
    ..Default::default()
  };
  let parties = visible(&*state.store, user.user_id, &query, params.limit, params.offset).await?;
  Ok(Json(parties))
}

#[derive(Debug, Deserialize, Default)]
pub struct PageParams {
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

/// `GET /parties/mine`
pub async fn mine<S, M>(
  State(state): State<AppState<S, M>>,
  Principal(user): Principal,
  Query(page): Query<PageParams>,
) -> Result<Json<Vec<PartyView>>, ApiError>
where
  S: PartyStore + 'static,
  M: MediaStore + 'static,
{
  let query = PartyQuery { owner: Some(user.user_id), ..Default::default() };
  let parties = state.store.search_parties(&query).await.map_err(ApiError::store)?;
  Ok(Json(paginate(parties, page.limit, page.offset)))
}

/// `GET /parties/participating`
pub async fn participating<S, M>(
  State(state): State<AppState<S, M>>,
  Principal(user): Principal,
  Query(page): Query<PageParams>,
) -> Result<Json<Vec<PartyView>>, ApiError>
where
  S: PartyStore + 'static,
  M: MediaStore + 'static,
{
  let query = PartyQuery { participant: Some(user.user_id), ..Default::default() };
  let parties = state.store.search_parties(&query).await.map_err(ApiError::store)?;
  Ok(Json(paginate(parties, page.limit, page.offset)))
}

// ─── Single party ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name:        String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub privacy:     PrivacyTier,
  pub location:    GeoPoint,
  pub start:       DateTime<Utc>,
  pub stop:        DateTime<Utc>,
}

/// `POST /parties`
pub async fn create<S, M>(
  State(state): State<AppState<S, M>>,
  Principal(user): Principal,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: PartyStore + 'static,
  M: MediaStore + 'static,
{
  let input = NewParty {
    name:        body.name,
    description: body.description,
    privacy:     body.privacy,
    location:    body.location,
    window:      TimeWindow::new(body.start, body.stop)?,
  };
  input.validate()?;

  let party = state
    .store
    .create_party(user.user_id, input)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(PartyView::from(party))))
}

/// `GET /parties/{id}`
pub async fn get_one<S, M>(
  State(state): State<AppState<S, M>>,
  Principal(user): Principal,
  Path(id): Path<Uuid>,
) -> Result<Json<PartyView>, ApiError>
where
  S: PartyStore + 'static,
  M: MediaStore + 'static,
{
  let party = load(&*state.store, id).await?;
  if !party_visible_to(&*state.store, &party, user.user_id)
    .await
    .map_err(ApiError::store)?
  {
    return Err(RuleError::PermissionDenied("you can not see this party").into());
  }
  Ok(Json(party.into()))
}

/// Any subset of fields; absent fields are left untouched.
#[derive(Debug, Deserialize, Default)]
pub struct UpdateBody {
  pub name:         Option<String>,
  pub description:  Option<String>,
  pub privacy:      Option<PrivacyTier>,
  pub location:     Option<GeoPoint>,
  pub start:        Option<DateTime<Utc>>,
  pub stop:         Option<DateTime<Utc>>,
  pub participants: Option<BTreeSet<Uuid>>,
}

impl From<UpdateBody> for PartyUpdate {
  fn from(b: UpdateBody) -> Self {
    Self {
      name:         b.name,
      description:  b.description,
      privacy:      b.privacy,
      location:     b.location,
      start:        b.start,
      stop:         b.stop,
      participants: b.participants,
    }
  }
}

/// `PUT|PATCH /parties/{id}`
pub async fn update<S, M>(
  State(state): State<AppState<S, M>>,
  Principal(user): Principal,
  Path(id): Path<Uuid>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<PartyView>, ApiError>
where
  S: PartyStore + 'static,
  M: MediaStore + 'static,
{
  let party = state
    .store
    .update_party(id, user.user_id, body.into())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(party.into()))
}

/// `DELETE /parties/{id}`: the owner deletes the party, a participant
/// leaves it.
pub async fn destroy<S, M>(
  State(state): State<AppState<S, M>>,
  Principal(user): Principal,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: PartyStore + 'static,
  M: MediaStore + 'static,
{
  let party = load(&*state.store, id).await?;
  if !party.is_participant(user.user_id) {
    return Err(RuleError::PermissionDenied("you do not participate in this party").into());
  }
  depart(&state, id, user.user_id, user.user_id).await
}

/// `DELETE /parties/{id}/participants/{user_id}`
pub async fn remove_participant<S, M>(
  State(state): State<AppState<S, M>>,
  Principal(user): Principal,
  Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError>
where
  S: PartyStore + 'static,
  M: MediaStore + 'static,
{
  depart(&state, id, user.user_id, user_id).await
}

async fn depart<S, M>(
  state: &AppState<S, M>,
  id: Uuid,
  actor: Uuid,
  user: Uuid,
) -> Result<StatusCode, ApiError>
where
  S: PartyStore + 'static,
  M: MediaStore + 'static,
{
  let departure = state
    .store
    .remove_participant(id, actor, user)
    .await
    .map_err(ApiError::store)?;

  match departure {
    Departure::Left => {
      tracing::info!(party_id = %id, %user, %actor, "participant removed");
    }
    Departure::PartyDeleted { image } => {
      tracing::info!(party_id = %id, owner = %user, "party deleted");
      media::release(&*state.media, [image]).await;
    }
  }
  Ok(StatusCode::NO_CONTENT)
}

/// `PUT /parties/{id}/image`: owner only, raw image body.
pub async fn upload_image<S, M>(
  State(state): State<AppState<S, M>>,
  Principal(user): Principal,
  Path(id): Path<Uuid>,
  headers: HeaderMap,
  body: Bytes,
) -> Result<Json<PartyView>, ApiError>
where
  S: PartyStore + 'static,
  M: MediaStore + 'static,
{
  let party = load(&*state.store, id).await?;
  check_owner(&party, user.user_id)?;

  let reference =
    media::store_upload(&*state.media, &state.policy, MediaKind::PartyImage, &headers, body)
      .await?;

  match state.store.set_party_image(id, user.user_id, reference.clone()).await {
    Ok(previous) => media::release(&*state.media, [previous]).await,
    Err(e) => {
      media::release(&*state.media, [reference]).await;
      return Err(ApiError::store(e));
    }
  }

  let party = load(&*state.store, id).await?;
  Ok(Json(party.into()))
}
