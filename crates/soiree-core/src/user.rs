//! Users, the identity records every other entity refers to by id.
//!
//! The password hash lives next to the user row in the store but is never part
//! of [`User`]; it is only reachable through
//! [`IdentityStore::credentials_by_email`](crate::store::IdentityStore::credentials_by_email).

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, media::MediaRef};

/// Registrants younger than this are rejected unless configured otherwise.
pub const DEFAULT_MIN_AGE: u32 = 18;

pub const MIN_PASSWORD_LEN: usize = 8;

// ─── Records ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:       Uuid,
  pub username:      String,
  /// Immutable after registration.
  pub email:         String,
  pub first_name:    String,
  pub last_name:     String,
  pub date_of_birth: NaiveDate,
  pub avatar:        MediaRef,
  pub created_at:    DateTime<Utc>,
}

/// Registration input. The password is hashed by the caller before it
/// reaches a store.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub username:      String,
  pub email:         String,
  pub first_name:    String,
  pub last_name:     String,
  pub date_of_birth: NaiveDate,
}

/// Partial update of a user's own profile. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
  pub username:      Option<String>,
  pub first_name:    Option<String>,
  pub last_name:     Option<String>,
  pub date_of_birth: Option<NaiveDate>,
  /// Replacement argon2 PHC string.
  pub password_hash: Option<String>,
}

/// What a store hands back to the auth layer.
#[derive(Debug, Clone)]
pub struct Credentials {
  pub user:          User,
  pub password_hash: String,
}

/// Text query over users, see
/// [`IdentityStore::find_users_by_text`](crate::store::IdentityStore::find_users_by_text).
#[derive(Debug, Clone, Default)]
pub struct UserQuery {
  /// Substring matched against username, first name and last name.
  pub text:   String,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

// ─── Validation ──────────────────────────────────────────────────────────────

/// Lower-case the domain part of an address, leaving the local part intact.
pub fn normalize_email(email: &str) -> String {
  let email = email.trim();
  match email.rsplit_once('@') {
    Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
    None => email.to_owned(),
  }
}

/// Whole years between `dob` and `today`.
pub fn age_on(dob: NaiveDate, today: NaiveDate) -> u32 {
  let mut years = today.year() - dob.year();
  if (today.month(), today.day()) < (dob.month(), dob.day()) {
    years -= 1;
  }
  years.max(0) as u32
}

fn validate_username(username: &str) -> Result<()> {
  let username = username.trim();
  if username.is_empty() {
    return Err(Error::validation("username must be set"));
  }
  if username.chars().count() > 150 {
    return Err(Error::validation("username is longer than 150 characters"));
  }
  if username.chars().any(char::is_whitespace) {
    return Err(Error::validation("username must not contain whitespace"));
  }
  Ok(())
}

fn validate_dob(dob: NaiveDate, today: NaiveDate, min_age: u32) -> Result<()> {
  if dob > today {
    return Err(Error::validation("date of birth lies in the future"));
  }
  if age_on(dob, today) < min_age {
    return Err(Error::validation(format!(
      "you must be at least {min_age} years old"
    )));
  }
  Ok(())
}

impl NewUser {
  /// Check everything that can be decided without looking at the store.
  /// Uniqueness of email and username is enforced by the store at write time.
  pub fn validate(&self, today: NaiveDate, min_age: u32) -> Result<()> {
    validate_username(&self.username)?;

    let email = self.email.trim();
    if email.is_empty() {
      return Err(Error::validation("email must be set"));
    }
    match email.split_once('@') {
      Some((local, domain))
        if !local.is_empty() && domain.contains('.') && !domain.ends_with('.') => {}
      _ => return Err(Error::validation(format!("{email:?} is not a valid email"))),
    }

    validate_dob(self.date_of_birth, today, min_age)
  }
}

impl UserUpdate {
  pub fn validate(&self, today: NaiveDate, min_age: u32) -> Result<()> {
    if let Some(username) = &self.username {
      validate_username(username)?;
    }
    if let Some(dob) = self.date_of_birth {
      validate_dob(dob, today, min_age)?;
    }
    Ok(())
  }
}

/// Reject credentials that are trivially guessable.
pub fn validate_password(password: &str, username: &str, email: &str) -> Result<()> {
  if password.chars().count() < MIN_PASSWORD_LEN {
    return Err(Error::validation(format!(
      "password must contain at least {MIN_PASSWORD_LEN} characters"
    )));
  }
  if password.chars().all(|c| c.is_ascii_digit()) {
    return Err(Error::validation("password must not be entirely numeric"));
  }

  let lowered = password.to_lowercase();
  let local = email.split('@').next().unwrap_or_default().to_lowercase();
  let username = username.to_lowercase();
  if (!username.is_empty() && lowered.contains(&username))
    || (local.len() >= 3 && lowered.contains(&local))
  {
    return Err(Error::validation("password is too similar to your account name"));
  }
  Ok(())
}
