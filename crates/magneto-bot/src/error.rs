//! Error type for the bot service.

use magneto_core::user::ChatId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("forecast error: {0}")]
  Feed(#[from] magneto_feed::Error),

  #[error(transparent)]
  Core(#[from] magneto_core::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("transport error: {0}")]
  Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("telegram {method} failed: {description}")]
  Telegram { method: String, description: String },

  /// One recipient of a broadcast could not be reached.
  #[error("delivery to {chat_id} failed: {reason}")]
  Delivery { chat_id: ChatId, reason: String },

  #[error("invalid schedule {expression:?}: {reason}")]
  Schedule { expression: String, reason: String },

  #[error("configuration error: {0}")]
  Config(String),
}

impl Error {
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }

  pub fn transport(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Transport(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
