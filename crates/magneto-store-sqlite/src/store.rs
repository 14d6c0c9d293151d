//! [`SqliteStore`], the SQLite implementation of [`PreferenceStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use magneto_core::{
  store::PreferenceStore,
  user::{
    ChatId, HealthRecord, PreferenceField, RecipientFilter, User, UserPreference,
    validate_threshold,
  },
};

use crate::{
  Error, Result,
  encode::{RawHealthRecord, RawUser, encode_dt, encode_uuid, preference_from_row},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Magneto preference store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Row helpers (run on the database thread) ────────────────────────────────

/// `(user_id, preference)` for a chat, if the user exists.
fn read_preference(
  conn: &rusqlite::Connection,
  chat_id: i64,
) -> rusqlite::Result<Option<(String, UserPreference)>> {
  conn
    .query_row(
      "SELECT p.user_id, p.notifications_enabled, p.survey_enabled, p.min_alert_threshold
       FROM profiles p
       JOIN users u ON u.user_id = p.user_id
       WHERE u.chat_id = ?1",
      rusqlite::params![chat_id],
      |row| Ok((row.get(0)?, preference_from_row(row, 1)?)),
    )
    .optional()
}

fn user_id_for_chat(
  conn: &rusqlite::Connection,
  chat_id: i64,
) -> rusqlite::Result<Option<String>> {
  conn
    .query_row(
      "SELECT user_id FROM users WHERE chat_id = ?1",
      rusqlite::params![chat_id],
      |row| row.get(0),
    )
    .optional()
}

// ─── PreferenceStore impl ────────────────────────────────────────────────────

impl PreferenceStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user_if_absent(&self, chat_id: ChatId, display_name: &str) -> Result<bool> {
    let user_id = encode_uuid(Uuid::new_v4());
    let at_str  = encode_dt(Utc::now());
    let name    = display_name.to_owned();

    let created = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let inserted = tx.execute(
          "INSERT OR IGNORE INTO users (user_id, chat_id, display_name, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![user_id, chat_id.0, name, at_str],
        )?;
        if inserted == 1 {
          tx.execute(
            "INSERT INTO profiles (user_id) VALUES (?1)",
            rusqlite::params![user_id],
          )?;
        }
        tx.commit()?;
        Ok(inserted == 1)
      })
      .await?;

    if created {
      tracing::info!(%chat_id, "created user");
    } else {
      tracing::debug!(%chat_id, "user already exists");
    }
    Ok(created)
  }

  async fn get_user(&self, chat_id: ChatId) -> Result<Option<User>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT user_id, chat_id, display_name, created_at FROM users WHERE chat_id = ?1",
            rusqlite::params![chat_id.0],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  // ── Preferences ───────────────────────────────────────────────────────────

  async fn get_preference(&self, chat_id: ChatId) -> Result<Option<UserPreference>> {
    let found = self
      .conn
      .call(move |conn| Ok(read_preference(conn, chat_id.0)?))
      .await?;
    Ok(found.map(|(_, pref)| pref))
  }

  async fn toggle(&self, chat_id: ChatId, field: PreferenceField) -> Result<bool> {
    let toggled: Option<bool> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some((user_id, mut pref)) = read_preference(&tx, chat_id.0)? else {
          return Ok(None);
        };

        let value = pref.toggle(field);
        match field {
          PreferenceField::Notifications => tx.execute(
            "UPDATE profiles SET notifications_enabled = ?1 WHERE user_id = ?2",
            rusqlite::params![value, user_id],
          )?,
          PreferenceField::Survey => tx.execute(
            "UPDATE profiles SET survey_enabled = ?1 WHERE user_id = ?2",
            rusqlite::params![value, user_id],
          )?,
        };
        tx.commit()?;
        Ok(Some(value))
      })
      .await?;

    let value = toggled.ok_or(magneto_core::Error::UserNotFound(chat_id))?;
    tracing::info!(%chat_id, %field, value, "toggled preference");
    Ok(value)
  }

  async fn set_threshold(&self, chat_id: ChatId, threshold: u8) -> Result<UserPreference> {
    let threshold = validate_threshold(threshold)?;

    let updated: Option<UserPreference> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE profiles SET min_alert_threshold = ?1
           WHERE user_id = (SELECT user_id FROM users WHERE chat_id = ?2)",
          rusqlite::params![threshold, chat_id.0],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        let pref = read_preference(&tx, chat_id.0)?.map(|(_, p)| p);
        tx.commit()?;
        Ok(pref)
      })
      .await?;

    Ok(updated.ok_or(magneto_core::Error::UserNotFound(chat_id))?)
  }

  async fn recipient_ids(&self, filter: RecipientFilter) -> Result<Vec<ChatId>> {
    let sql = match filter {
      RecipientFilter::Notifications => {
        "SELECT u.chat_id FROM users u
         JOIN profiles p ON p.user_id = u.user_id
         WHERE p.notifications_enabled = 1
         ORDER BY u.created_at, u.chat_id"
      }
      RecipientFilter::Survey => {
        "SELECT u.chat_id FROM users u
         JOIN profiles p ON p.user_id = u.user_id
         WHERE p.survey_enabled = 1
         ORDER BY u.created_at, u.chat_id"
      }
    };

    let ids: Vec<i64> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(ids.into_iter().map(ChatId).collect())
  }

  // ── Survey log ────────────────────────────────────────────────────────────

  async fn record_survey_response(
    &self,
    chat_id:       ChatId,
    response_text: &str,
    index_value:   Option<f64>,
  ) -> Result<bool> {
    let record_id = encode_uuid(Uuid::new_v4());
    let at_str    = encode_dt(Utc::now());
    let response  = response_text.to_owned();

    let recorded = self
      .conn
      .call(move |conn| {
        let Some(user_id) = user_id_for_chat(conn, chat_id.0)? else {
          return Ok(false);
        };
        conn.execute(
          "INSERT INTO health_records (record_id, user_id, response_text, index_value, recorded_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![record_id, user_id, response, index_value, at_str],
        )?;
        Ok(true)
      })
      .await?;

    if !recorded {
      tracing::warn!(%chat_id, "survey answer from unknown user dropped");
    }
    Ok(recorded)
  }

  async fn health_records(&self, chat_id: ChatId) -> Result<Vec<HealthRecord>> {
    let raws: Vec<RawHealthRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT h.record_id, h.user_id, h.response_text, h.index_value, h.recorded_at
           FROM health_records h
           JOIN users u ON u.user_id = h.user_id
           WHERE u.chat_id = ?1
           ORDER BY h.recorded_at, h.rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![chat_id.0], RawHealthRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawHealthRecord::into_record).collect()
  }
}
