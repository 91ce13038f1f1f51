//! JSON REST API for Soirée.
//!
//! Exposes an axum [`Router`] backed by any [`PartyStore`] and
//! [`MediaStore`]. Every route except registration and public profiles
//! requires HTTP Basic credentials; see [`auth`]. TLS and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = soiree_api::api_router(AppState::new(store, media, Policy::default()));
//! ```

pub mod auth;
pub mod error;
pub mod friends;
pub mod media;
pub mod membership;
pub mod parties;
pub mod users;
pub mod views;

use std::sync::Arc;

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{delete, get, post, put},
};
use soiree_core::{media::MediaStore, store::PartyStore, user::DEFAULT_MIN_AGE};

pub use auth::Principal;
pub use error::ApiError;

// ─── Application state ───────────────────────────────────────────────────────

/// Request-independent limits applied by the handlers.
#[derive(Debug, Clone)]
pub struct Policy {
  /// Registrants younger than this many years are rejected.
  pub min_age:          u32,
  /// Upper bound on avatar and party image uploads.
  pub max_upload_bytes: usize,
}

impl Default for Policy {
  fn default() -> Self {
    Self {
      min_age:          DEFAULT_MIN_AGE,
      max_upload_bytes: 5 * 1024 * 1024,
    }
  }
}

/// Shared state threaded through all axum handlers.
pub struct AppState<S, M> {
  pub store:  Arc<S>,
  pub media:  Arc<M>,
  pub policy: Arc<Policy>,
}

impl<S, M> AppState<S, M> {
  pub fn new(store: S, media: M, policy: Policy) -> Self {
    Self {
      store:  Arc::new(store),
      media:  Arc::new(media),
      policy: Arc::new(policy),
    }
  }
}

impl<S, M> Clone for AppState<S, M> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      media:  Arc::clone(&self.media),
      policy: Arc::clone(&self.policy),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, M>(state: AppState<S, M>) -> Router<()>
where
  S: PartyStore + 'static,
  M: MediaStore + 'static,
{
  let upload_limit = state.policy.max_upload_bytes;

  Router::new()
    // Users
    .route("/users", post(users::register::<S, M>))
    .route(
      "/users/me",
      get(users::me)
        .put(users::update_me::<S, M>)
        .patch(users::update_me::<S, M>)
        .delete(users::delete_me::<S, M>),
    )
    .route("/users/me/avatar", put(users::upload_avatar::<S, M>))
    .route("/users/search", get(users::search::<S, M>))
    .route("/users/{id}", get(users::profile::<S, M>))
    // Friends
    .route("/friends", get(friends::list::<S, M>))
    .route("/friends/{user_id}", delete(friends::unfriend::<S, M>))
    .route(
      "/friends/invitations",
      get(friends::received::<S, M>).post(friends::invite::<S, M>),
    )
    .route("/friends/invitations/sent", get(friends::sent::<S, M>))
    .route("/friends/invitations/{id}", delete(friends::discard::<S, M>))
    .route("/friends/invitations/{id}/accept", post(friends::accept::<S, M>))
    // Parties
    .route("/parties", get(parties::list::<S, M>).post(parties::create::<S, M>))
    .route("/parties/mine", get(parties::mine::<S, M>))
    .route("/parties/participating", get(parties::participating::<S, M>))
    .route(
      "/parties/{id}",
      get(parties::get_one::<S, M>)
        .put(parties::update::<S, M>)
        .patch(parties::update::<S, M>)
        .delete(parties::destroy::<S, M>),
    )
    .route("/parties/{id}/image", put(parties::upload_image::<S, M>))
    .route(
      "/parties/{id}/participants/{user_id}",
      delete(parties::remove_participant::<S, M>),
    )
    // Membership
    .route(
      "/parties/{id}/invitations",
      get(membership::list_invitations::<S, M>).post(membership::invite::<S, M>),
    )
    .route(
      "/parties/{id}/invitations/{invitation_id}",
      delete(membership::discard_invitation::<S, M>),
    )
    .route(
      "/parties/{id}/invitations/{invitation_id}/accept",
      post(membership::accept_invitation::<S, M>),
    )
    .route(
      "/parties/{id}/requests",
      get(membership::list_requests::<S, M>).post(membership::request::<S, M>),
    )
    .route(
      "/parties/{id}/requests/{request_id}",
      delete(membership::discard_request::<S, M>),
    )
    .route(
      "/parties/{id}/requests/{request_id}/accept",
      post(membership::accept_request::<S, M>),
    )
    .route("/me/party-invitations", get(membership::my_invitations::<S, M>))
    .route("/me/party-requests", get(membership::my_requests::<S, M>))
    .layer(DefaultBodyLimit::max(upload_limit))
    .with_state(state)
}
