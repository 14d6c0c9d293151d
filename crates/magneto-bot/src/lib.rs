//! Telegram bot service for Magneto.
//!
//! Wires the forecast pipeline ([`magneto_feed`]) and a [`PreferenceStore`]
//! to a chat [`Transport`]: interactive commands and callbacks, the two daily
//! broadcasts, and the scheduler that triggers them.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod forecast;
pub mod handlers;
pub mod keyboards;
pub mod polling;
pub mod scheduler;
pub mod source;
pub mod telegram;
pub mod texts;
pub mod webhook;

#[cfg(test)]
pub(crate) mod testing;

pub use config::BotConfig;
pub use error::{Error, Result};

use std::sync::Arc;

use magneto_core::{store::PreferenceStore, transport::Transport};

use source::ForecastSource;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through handlers, broadcasts and the scheduler.
///
/// Nothing here caches forecast data: every request and every broadcast run
/// fetches the feed and reads preferences afresh.
pub struct App<S, T, F> {
  pub store:     Arc<S>,
  pub transport: Arc<T>,
  pub source:    Arc<F>,
  pub config:    Arc<BotConfig>,
}

impl<S, T, F> App<S, T, F>
where
  S: PreferenceStore + 'static,
  T: Transport + 'static,
  F: ForecastSource + 'static,
{
  pub fn new(store: S, transport: T, source: F, config: BotConfig) -> Self {
    Self {
      store:     Arc::new(store),
      transport: Arc::new(transport),
      source:    Arc::new(source),
      config:    Arc::new(config),
    }
  }
}

impl<S, T, F> Clone for App<S, T, F> {
  fn clone(&self) -> Self {
    Self {
      store:     Arc::clone(&self.store),
      transport: Arc::clone(&self.transport),
      source:    Arc::clone(&self.source),
      config:    Arc::clone(&self.config),
    }
  }
}
