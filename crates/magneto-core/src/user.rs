//! Users, their notification preferences, and the survey log.
//!
//! A user is created on first contact together with a preference record. The
//! preference record is only mutated through [`PreferenceField`] toggles and
//! threshold edits; the health log is append-only.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Identity ────────────────────────────────────────────────────────────────

/// The external chat identifier a user is addressed by.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

/// A registered bot user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub user_id:      Uuid,
  pub chat_id:      ChatId,
  pub display_name: String,
  pub created_at:   DateTime<Utc>,
}

// ─── Preferences ─────────────────────────────────────────────────────────────

pub const MIN_ALERT_THRESHOLD: u8 = 1;
pub const MAX_ALERT_THRESHOLD: u8 = 9;

/// Per-user delivery settings. One per user, created alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreference {
  pub notifications_enabled: bool,
  pub survey_enabled:        bool,
  /// Lowest daily maximum Kp the user wants to be alerted about.
  pub min_alert_threshold:   u8,
}

impl Default for UserPreference {
  fn default() -> Self {
    Self {
      notifications_enabled: true,
      survey_enabled:        true,
      min_alert_threshold:   MIN_ALERT_THRESHOLD,
    }
  }
}

impl UserPreference {
  pub fn get(&self, field: PreferenceField) -> bool {
    match field {
      PreferenceField::Notifications => self.notifications_enabled,
      PreferenceField::Survey => self.survey_enabled,
    }
  }

  /// Flip `field` and return its new value.
  pub fn toggle(&mut self, field: PreferenceField) -> bool {
    let slot = match field {
      PreferenceField::Notifications => &mut self.notifications_enabled,
      PreferenceField::Survey => &mut self.survey_enabled,
    };
    *slot = !*slot;
    *slot
  }

  /// Whether an alert for a day with maximum `kp` clears this user's bar.
  pub fn wants_alert(&self, kp: f64) -> bool {
    kp >= f64::from(self.min_alert_threshold)
  }
}

/// Check that `value` is an acceptable alert threshold.
pub fn validate_threshold(value: u8) -> Result<u8> {
  if (MIN_ALERT_THRESHOLD..=MAX_ALERT_THRESHOLD).contains(&value) {
    Ok(value)
  } else {
    Err(Error::ThresholdOutOfRange(value))
  }
}

/// The closed set of boolean preferences a user may toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum PreferenceField {
  #[strum(to_string = "notifications")]
  Notifications,
  /// `query` is the identifier older menus used for this field.
  #[strum(to_string = "survey", serialize = "query")]
  Survey,
}

impl PreferenceField {
  /// Resolve a field identifier, rejecting anything outside the closed set.
  pub fn parse(name: &str) -> Result<Self> {
    Self::from_str(name.trim())
      .map_err(|_| Error::UnknownPreferenceField(name.to_string()))
  }
}

/// Which broadcast a recipient list is being assembled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RecipientFilter {
  Notifications,
  Survey,
}

impl RecipientFilter {
  pub fn field(self) -> PreferenceField {
    match self {
      Self::Notifications => PreferenceField::Notifications,
      Self::Survey => PreferenceField::Survey,
    }
  }
}

// ─── Survey log ──────────────────────────────────────────────────────────────

/// One answer to the evening well-being survey. Never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthRecord {
  pub record_id:     Uuid,
  pub user_id:       Uuid,
  pub response_text: String,
  /// The day's maximum Kp when the answer was given, if the feed had one.
  pub index_value:   Option<f64>,
  pub recorded_at:   DateTime<Utc>,
}
