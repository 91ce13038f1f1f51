//! Handlers for `/users` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/users` | Registration, no auth. Body: [`RegisterBody`] |
//! | `GET`  | `/users/me` | Own account |
//! | `PUT`/`PATCH` | `/users/me` | Body: [`UpdateBody`]; email is immutable |
//! | `DELETE` | `/users/me` | Cascades to everything the user owns |
//! | `PUT`  | `/users/me/avatar` | Raw image body |
//! | `GET`  | `/users/search` | `?q=&limit=&offset=` |
//! | `GET`  | `/users/{id}` | Public profile, no auth |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
};
use bytes::Bytes;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use soiree_core::{
  media::{MediaKind, MediaStore},
  store::PartyStore,
  user::{NewUser, UserQuery, UserUpdate, normalize_email, validate_password},
};
use uuid::Uuid;

use crate::{
  AppState, Principal, auth,
  error::ApiError,
  media,
  views::{ProfileView, UserView, many},
};

// ─── Register ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub username:      String,
  pub email:         String,
  pub password:      String,
  #[serde(default)]
  pub first_name:    String,
  #[serde(default)]
  pub last_name:     String,
  pub date_of_birth: NaiveDate,
}

/// `POST /users`
pub async fn register<S, M>(
  State(state): State<AppState<S, M>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: PartyStore + 'static,
  M: MediaStore + 'static,
{
  let input = NewUser {
    username:      body.username,
    email:         body.email,
    first_name:    body.first_name,
    last_name:     body.last_name,
    date_of_birth: body.date_of_birth,
  };
  input.validate(Utc::now().date_naive(), state.policy.min_age)?;
  validate_password(&body.password, &input.username, &input.email)?;

  let hash = auth::hash_password(&body.password)?;
  let user = state
    .store
    .create_user(input, hash)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(UserView::from(user))))
}

// ─── Own account ─────────────────────────────────────────────────────────────

/// `GET /users/me`
pub async fn me(Principal(user): Principal) -> Json<UserView> { Json(user.into()) }

/// Any subset of fields; absent fields are left untouched.
#[derive(Debug, Deserialize, Default)]
pub struct UpdateBody {
  pub username:      Option<String>,
  /// Accepted only when unchanged.
  pub email:         Option<String>,
  pub first_name:    Option<String>,
  pub last_name:     Option<String>,
  pub date_of_birth: Option<NaiveDate>,
  pub password:      Option<String>,
}

/// `PUT|PATCH /users/me`
pub async fn update_me<S, M>(
  State(state): State<AppState<S, M>>,
  Principal(user): Principal,
  Json(body): Json<UpdateBody>,
) -> Result<Json<UserView>, ApiError>
where
  S: PartyStore + 'static,
  M: MediaStore + 'static,
{
  if let Some(email) = &body.email
    && normalize_email(email) != user.email
  {
    return Err(ApiError::BadRequest("email can not be changed".into()));
  }

  let password_hash = match &body.password {
    Some(password) => {
      let username = body.username.as_deref().unwrap_or(&user.username);
      validate_password(password, username, &user.email)?;
      Some(auth::hash_password(password)?)
    }
    None => None,
  };

  let update = UserUpdate {
    username: body.username,
    first_name: body.first_name,
    last_name: body.last_name,
    date_of_birth: body.date_of_birth,
    password_hash,
  };
  update.validate(Utc::now().date_naive(), state.policy.min_age)?;

  let updated = state
    .store
    .update_user(user.user_id, update)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(updated.into()))
}

/// `DELETE /users/me`
pub async fn delete_me<S, M>(
  State(state): State<AppState<S, M>>,
  Principal(user): Principal,
) -> Result<StatusCode, ApiError>
where
  S: PartyStore + 'static,
  M: MediaStore + 'static,
{
  let released = state
    .store
    .delete_user(user.user_id)
    .await
    .map_err(ApiError::store)?;
  media::release(&*state.media, released).await;
  Ok(StatusCode::NO_CONTENT)
}

/// `PUT /users/me/avatar`: raw image body, `Content-Type` picks the
/// extension.
pub async fn upload_avatar<S, M>(
  State(state): State<AppState<S, M>>,
  Principal(mut user): Principal,
  headers: HeaderMap,
  body: Bytes,
) -> Result<Json<UserView>, ApiError>
where
  S: PartyStore + 'static,
  M: MediaStore + 'static,
{
  let reference =
    media::store_upload(&*state.media, &state.policy, MediaKind::Avatar, &headers, body).await?;

  match state.store.set_avatar(user.user_id, reference.clone()).await {
    Ok(previous) => media::release(&*state.media, [previous]).await,
    Err(e) => {
      media::release(&*state.media, [reference]).await;
      return Err(ApiError::store(e));
    }
  }

  user.avatar = reference;
  Ok(Json(user.into()))
}

// ─── Lookup ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct SearchParams {
  /// Substring over username, first name and last name.
  #[serde(default)]
  pub q:      String,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

/// `GET /users/search?q=<text>[&limit=..][&offset=..]`
pub async fn search<S, M>(
  State(state): State<AppState<S, M>>,
  _: Principal,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<ProfileView>>, ApiError>
where
  S: PartyStore + 'static,
  M: MediaStore + 'static,
{
  let query = UserQuery {
    text:   params.q,
    limit:  params.limit,
    offset: params.offset,
  };
  let users = state
    .store
    .find_users_by_text(&query)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(many(users)))
}

/// `GET /users/{id}`
pub async fn profile<S, M>(
  State(state): State<AppState<S, M>>,
  Path(id): Path<Uuid>,
) -> Result<Json<ProfileView>, ApiError>
where
  S: PartyStore + 'static,
  M: MediaStore + 'static,
{
  let user = state
    .store
    .get_user(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))?;
  Ok(Json(user.into()))
}
