//! Parties: hosted events with a privacy tier, schedule, location and
//! participant set.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, media::MediaRef};

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Mean Earth radius in metres, used for great-circle distances.
const EARTH_RADIUS_M: f64 = 6_371_008.8;

// ─── Privacy ─────────────────────────────────────────────────────────────────

/// Who may see a party; see [`crate::visibility::can_see`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyTier {
  /// Visible to friends of the owner.
  #[default]
  Private,
  /// Visible to everyone.
  Public,
  /// Visible to participants only.
  Secret,
}

impl PrivacyTier {
  /// Whether deciding visibility requires a friendship lookup.
  pub fn needs_friendship(self) -> bool { matches!(self, Self::Private) }
}

// ─── Location ────────────────────────────────────────────────────────────────

/// A WGS84 point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
  pub latitude:  f64,
  pub longitude: f64,
}

impl GeoPoint {
  pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
    let point = Self { latitude, longitude };
    point.validate()?;
    Ok(point)
  }

  pub fn validate(&self) -> Result<()> {
    if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
      return Err(Error::validation(format!(
        "latitude {} is outside [-90, 90]",
        self.latitude
      )));
    }
    if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
      return Err(Error::validation(format!(
        "longitude {} is outside [-180, 180]",
        self.longitude
      )));
    }
    Ok(())
  }

  /// Great-circle (haversine) distance in metres.
  pub fn distance_m(&self, other: &GeoPoint) -> f64 {
    let (lat1, lat2) = (self.latitude.to_radians(), other.latitude.to_radians());
    let d_lat = lat2 - lat1;
    let d_lon = (other.longitude - self.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
      + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
  }

  /// A latitude/longitude box that contains every point within `radius_m`.
  ///
  /// Used as a coarse SQL prefilter; callers still check
  /// [`distance_m`](Self::distance_m). Near the poles the longitude span
  /// widens to the whole globe.
  pub fn bounding_box(&self, radius_m: f64) -> GeoBox {
    let d_lat = (radius_m / EARTH_RADIUS_M).to_degrees();
    let min_lat = (self.latitude - d_lat).max(-90.0);
    let max_lat = (self.latitude + d_lat).min(90.0);

    let cos_lat = self.latitude.to_radians().cos();
    if max_lat >= 90.0 || min_lat <= -90.0 || cos_lat <= f64::EPSILON {
      return GeoBox { min_lat, max_lat, min_lon: -180.0, max_lon: 180.0 };
    }

    let d_lon = (radius_m / (EARTH_RADIUS_M * cos_lat)).to_degrees();
    if d_lon >= 180.0 {
      return GeoBox { min_lat, max_lat, min_lon: -180.0, max_lon: 180.0 };
    }
    GeoBox {
      min_lat,
      max_lat,
      min_lon: self.longitude - d_lon,
      max_lon: self.longitude + d_lon,
    }
  }
}

/// Axis-aligned box in degrees. `min_lon` may be below -180 or `max_lon`
/// above 180 when the box crosses the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBox {
  pub min_lat: f64,
  pub max_lat: f64,
  pub min_lon: f64,
  pub max_lon: f64,
}

/// Parties within `radius_m` metres of `center`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoFilter {
  pub center:   GeoPoint,
  pub radius_m: f64,
}

// ─── Schedule ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
  pub start: DateTime<Utc>,
  pub stop:  DateTime<Utc>,
}

impl TimeWindow {
  pub fn new(start: DateTime<Utc>, stop: DateTime<Utc>) -> Result<Self> {
    let window = Self { start, stop };
    window.validate()?;
    Ok(window)
  }

  pub fn validate(&self) -> Result<()> {
    if self.start >= self.stop {
      return Err(Error::validation("stop time must occur after start time"));
    }
    Ok(())
  }
}

// ─── Records ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Party {
  pub party_id:     Uuid,
  pub owner:        Uuid,
  pub name:         String,
  pub description:  String,
  pub privacy:      PrivacyTier,
  pub location:     GeoPoint,
  pub window:       TimeWindow,
  /// Always contains `owner`.
  pub participants: BTreeSet<Uuid>,
  pub image:        MediaRef,
  pub created_at:   DateTime<Utc>,
}

impl Party {
  pub fn is_owner(&self, user: Uuid) -> bool { self.owner == user }

  pub fn is_participant(&self, user: Uuid) -> bool { self.participants.contains(&user) }
}

fn validate_text(name: &str, description: &str) -> Result<()> {
  if name.trim().is_empty() {
    return Err(Error::validation("party name must be set"));
  }
  if name.chars().count() > MAX_NAME_LEN {
    return Err(Error::validation(format!(
      "party name is longer than {MAX_NAME_LEN} characters"
    )));
  }
  if description.chars().count() > MAX_DESCRIPTION_LEN {
    return Err(Error::validation(format!(
      "description is longer than {MAX_DESCRIPTION_LEN} characters"
    )));
  }
  Ok(())
}

/// Input for [`PartyStore::create_party`](crate::store::PartyStore::create_party).
/// The owner comes from the authenticated caller, never from the body.
#[derive(Debug, Clone)]
pub struct NewParty {
  pub name:        String,
  pub description: String,
  pub privacy:     PrivacyTier,
  pub location:    GeoPoint,
  pub window:      TimeWindow,
}

impl NewParty {
  pub fn validate(&self) -> Result<()> {
    validate_text(&self.name, &self.description)?;
    self.location.validate()?;
    self.window.validate()
  }
}

/// Owner-issued change to a party. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct PartyUpdate {
  pub name:         Option<String>,
  pub description:  Option<String>,
  pub privacy:      Option<PrivacyTier>,
  pub location:     Option<GeoPoint>,
  pub start:        Option<DateTime<Utc>>,
  pub stop:         Option<DateTime<Utc>>,
  /// Replacement participant list. May only drop existing participants and
  /// must keep the owner.
  pub participants: Option<BTreeSet<Uuid>>,
}

impl PartyUpdate {
  /// Merge this update into `party`, validating the result before anything is
  /// written. Returns the updated party; `party` itself is untouched.
  pub fn apply_to(&self, party: &Party) -> Result<Party> {
    let mut next = party.clone();

    if let Some(name) = &self.name {
      next.name = name.trim().to_owned();
    }
    if let Some(description) = &self.description {
      next.description = description.clone();
    }
    if let Some(privacy) = self.privacy {
      next.privacy = privacy;
    }
    if let Some(location) = self.location {
      next.location = location;
    }
    if let Some(start) = self.start {
      next.window.start = start;
    }
    if let Some(stop) = self.stop {
      next.window.stop = stop;
    }
    if let Some(participants) = &self.participants {
      if !participants.contains(&party.owner) {
        return Err(Error::validation(
          "you can not remove yourself from the participant list",
        ));
      }
      if let Some(stranger) = participants.difference(&party.participants).next() {
        return Err(Error::validation(format!(
          "user {stranger} must be invited before joining"
        )));
      }
      next.participants = participants.clone();
    }

    validate_text(&next.name, &next.description)?;
    next.location.validate()?;
    next.window.validate()?;
    Ok(next)
  }
}

// ─── Query type ──────────────────────────────────────────────────────────────

/// Candidate selection for
/// [`PartyStore::search_parties`](crate::store::PartyStore::search_parties).
///
/// Visibility is *not* applied here; callers post-filter with
/// [`crate::visibility::can_see`].
#[derive(Debug, Clone, Default)]
pub struct PartyQuery {
  /// Substring over name and description.
  pub text:        Option<String>,
  pub near:        Option<GeoFilter>,
  pub owner:       Option<Uuid>,
  pub participant: Option<Uuid>,
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone};

  use super::*;

  fn party() -> Party {
    let owner = Uuid::new_v4();
    let start = Utc.with_ymd_and_hms(2023, 1, 1, 20, 30, 0).unwrap();
    Party {
      party_id:     Uuid::new_v4(),
      owner,
      name:         "party name".into(),
      description:  "description".into(),
      privacy:      PrivacyTier::Private,
      location:     GeoPoint { latitude: 10.0, longitude: 10.0 },
      window:       TimeWindow { start, stop: start + Duration::hours(6) },
      participants: BTreeSet::from([owner]),
      image:        crate::media::MediaKind::PartyImage.default_reference(),
      created_at:   Utc::now(),
    }
  }

  #[test]
  fn window_requires_start_before_stop() {
    let t = Utc::now();
    assert!(TimeWindow::new(t, t).is_err());
    assert!(TimeWindow::new(t, t - Duration::minutes(1)).is_err());
    assert!(TimeWindow::new(t, t + Duration::minutes(1)).is_ok());
  }

  #[test]
  fn update_cannot_drop_owner() {
    let p = party();
    let update = PartyUpdate {
      participants: Some(BTreeSet::new()),
      ..Default::default()
    };
    assert!(matches!(update.apply_to(&p), Err(Error::Validation(_))));
  }

  #[test]
  fn update_cannot_add_strangers() {
    let p = party();
    let update = PartyUpdate {
      participants: Some(BTreeSet::from([p.owner, Uuid::new_v4()])),
      ..Default::default()
    };
    assert!(update.apply_to(&p).is_err());
  }

  #[test]
  fn update_checks_merged_window() {
    let p = party();
    let update = PartyUpdate {
      stop: Some(p.window.start - Duration::hours(1)),
      ..Default::default()
    };
    assert!(update.apply_to(&p).is_err());

    let update = PartyUpdate {
      name: Some("renamed".into()),
      start: Some(p.window.start - Duration::hours(1)),
      ..Default::default()
    };
    let next = update.apply_to(&p).unwrap();
    assert_eq!(next.name, "renamed");
    assert_eq!(p.name, "party name");
  }

  #[test]
  fn update_trims_the_name() {
    let p = party();
    let update = PartyUpdate { name: Some("  renamed \n".into()), ..Default::default() };
    assert_eq!(update.apply_to(&p).unwrap().name, "renamed");

    let blank = PartyUpdate { name: Some("   ".into()), ..Default::default() };
    assert!(matches!(blank.apply_to(&p), Err(Error::Validation(_))));
  }

  #[test]
  fn haversine_distance() {
    let warsaw = GeoPoint::new(52.2297, 21.0122).unwrap();
    let krakow = GeoPoint::new(50.0647, 19.9450).unwrap();
    let d = warsaw.distance_m(&krakow);
    assert!((d - 252_000.0).abs() < 2_000.0, "distance {d}");
    assert_eq!(warsaw.distance_m(&warsaw), 0.0);
  }

  #[test]
  fn bounding_box_contains_radius() {
    let center = GeoPoint::new(12.0, 12.0).unwrap();
    let bbox = center.bounding_box(10_000.0);
    assert!(bbox.min_lat < 12.0 && bbox.max_lat > 12.0);
    assert!(bbox.max_lat - 12.0 > 0.089 && bbox.max_lat - 12.0 < 0.091);
    assert!(bbox.min_lon < 11.91 && bbox.max_lon > 12.09);
  }

  #[test]
  fn privacy_tier_wire_names() {
    assert_eq!(serde_json::to_string(&PrivacyTier::Secret).unwrap(), "\"secret\"");
    let tier: PrivacyTier = serde_json::from_str("\"public\"").unwrap();
    assert_eq!(tier, PrivacyTier::Public);
    assert_eq!(PrivacyTier::default(), PrivacyTier::Private);
  }

  #[test]
  fn out_of_range_points_are_rejected() {
    assert!(GeoPoint::new(91.0, 0.0).is_err());
    assert!(GeoPoint::new(0.0, f64::NAN).is_err());
  }
}
