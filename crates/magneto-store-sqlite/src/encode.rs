//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings and UUIDs as hyphenated
//! lowercase strings. Booleans and small integers use native INTEGER columns.

use chrono::{DateTime, Utc};
use magneto_core::user::{ChatId, HealthRecord, User, UserPreference};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Preferences ─────────────────────────────────────────────────────────────

/// Read the three preference columns starting at column `offset`.
pub fn preference_from_row(
  row: &rusqlite::Row<'_>,
  offset: usize,
) -> rusqlite::Result<UserPreference> {
  Ok(UserPreference {
    notifications_enabled: row.get(offset)?,
    survey_enabled:        row.get(offset + 1)?,
    min_alert_threshold:   row.get(offset + 2)?,
  })
}

// ─── Raw row types ───────────────────────────────────────────────────────────

/// A `users` row as read from SQLite, before decoding.
pub struct RawUser {
  pub user_id:      String,
  pub chat_id:      i64,
  pub display_name: String,
  pub created_at:   String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:      row.get(0)?,
      chat_id:      row.get(1)?,
      display_name: row.get(2)?,
      created_at:   row.get(3)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:      decode_uuid(&self.user_id)?,
      chat_id:      ChatId(self.chat_id),
      display_name: self.display_name,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// A `health_records` row as read from SQLite, before decoding.
pub struct RawHealthRecord {
  pub record_id:     String,
  pub user_id:       String,
  pub response_text: String,
  pub index_value:   Option<f64>,
  pub recorded_at:   String,
}

impl RawHealthRecord {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      record_id:     row.get(0)?,
      user_id:       row.get(1)?,
      response_text: row.get(2)?,
      index_value:   row.get(3)?,
      recorded_at:   row.get(4)?,
    })
  }

  pub fn into_record(self) -> Result<HealthRecord> {
    Ok(HealthRecord {
      record_id:     decode_uuid(&self.record_id)?,
      user_id:       decode_uuid(&self.user_id)?,
      response_text: self.response_text,
      index_value:   self.index_value,
      recorded_at:   decode_dt(&self.recorded_at)?,
    })
  }
}
