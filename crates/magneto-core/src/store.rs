//! The `PreferenceStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `magneto-store-sqlite`).
//! The bot depends on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::user::{ChatId, HealthRecord, PreferenceField, RecipientFilter, User, UserPreference};

/// Abstraction over user, preference and survey-log persistence.
///
/// Integrity violations that a caller can reasonably expect (a user who
/// already exists, a survey answer from an unknown chat) are reported as
/// `false` rather than as errors.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes.
pub trait PreferenceStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Create a user together with a default preference record.
  ///
  /// Returns `false` if a user with this chat id already exists.
  fn create_user_if_absent<'a>(
    &'a self,
    chat_id: ChatId,
    display_name: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Retrieve a user by chat id. Returns `None` if not found.
  fn get_user(
    &self,
    chat_id: ChatId,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  // ── Preferences ───────────────────────────────────────────────────────

  /// Read a user's preferences. Returns `None` if the user is unknown.
  fn get_preference(
    &self,
    chat_id: ChatId,
  ) -> impl Future<Output = Result<Option<UserPreference>, Self::Error>> + Send + '_;

  /// Flip a boolean preference and return its new value.
  ///
  /// Returns an error if the user does not exist.
  fn toggle(
    &self,
    chat_id: ChatId,
    field: PreferenceField,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Replace the minimum alert threshold and return the updated preferences.
  ///
  /// Returns an error if the value is out of range or the user does not exist.
  fn set_threshold(
    &self,
    chat_id: ChatId,
    threshold: u8,
  ) -> impl Future<Output = Result<UserPreference, Self::Error>> + Send + '_;

  /// Chat ids of every user who has the broadcast selected by `filter` enabled.
  fn recipient_ids(
    &self,
    filter: RecipientFilter,
  ) -> impl Future<Output = Result<Vec<ChatId>, Self::Error>> + Send + '_;

  // ── Survey log (append-only) ──────────────────────────────────────────

  /// Append a survey answer. Returns `false` if the user is unknown.
  fn record_survey_response<'a>(
    &'a self,
    chat_id: ChatId,
    response_text: &'a str,
    index_value: Option<f64>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// All survey answers of a user, oldest first.
  fn health_records(
    &self,
    chat_id: ChatId,
  ) -> impl Future<Output = Result<Vec<HealthRecord>, Self::Error>> + Send + '_;
}
