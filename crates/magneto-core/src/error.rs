//! Error types for `magneto-core`.

use thiserror::Error;

use crate::user::ChatId;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown preference field: {0:?}")]
  UnknownPreferenceField(String),

  #[error("alert threshold {0} is outside the allowed range")]
  ThresholdOutOfRange(u8),

  #[error("user not found: {0}")]
  UserNotFound(ChatId),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
