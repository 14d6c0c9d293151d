//! Service configuration.
//!
//! Loaded from a TOML file (optional) layered under `MAGNETO_*` environment
//! variables. Nested keys use `__`, e.g. `MAGNETO_SCHEDULE__UTC_OFFSET_HOURS`.

use std::{path::PathBuf, time::Duration};

use chrono::FixedOffset;
use serde::Deserialize;

use crate::{Error, Result};

pub const ENV_PREFIX: &str = "MAGNETO";

#[derive(Clone, Deserialize)]
pub struct BotConfig {
  /// Telegram bot token. Only required by commands that talk to Telegram.
  #[serde(default)]
  pub bot_token:         String,
  #[serde(default = "default_store_path")]
  pub store_path:        PathBuf,
  #[serde(default = "default_feed_url")]
  pub feed_url:          String,
  #[serde(default = "default_feed_timeout_secs")]
  pub feed_timeout_secs: u64,
  #[serde(default)]
  pub telegram:          TelegramConfig,
  #[serde(default)]
  pub schedule:          ScheduleConfig,
  #[serde(default)]
  pub notifications:     NotificationConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TelegramConfig {
  #[serde(default = "default_api_base")]
  pub api_base:          String,
  #[serde(default = "default_parse_mode")]
  pub parse_mode:        Option<String>,
  #[serde(default = "default_send_timeout_secs")]
  pub send_timeout_secs: u64,
  #[serde(default = "default_poll_timeout_secs")]
  pub poll_timeout_secs: u64,
  /// When present, updates arrive over HTTPS instead of long polling.
  #[serde(default)]
  pub webhook:           Option<WebhookConfig>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WebhookConfig {
  #[serde(default = "default_host")]
  pub host:         String,
  #[serde(default = "default_port")]
  pub port:         u16,
  /// Public HTTPS URL registered with Telegram, e.g.
  /// `https://bot.example.org/telegram/webhook`.
  pub public_url:   String,
  #[serde(default)]
  pub secret_token: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ScheduleConfig {
  /// Offset of the local wall clock the cron expressions are written in.
  #[serde(default = "default_utc_offset_hours")]
  pub utc_offset_hours:   i32,
  #[serde(default = "default_notifications_cron")]
  pub notifications_cron: String,
  #[serde(default = "default_survey_cron")]
  pub survey_cron:        String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct NotificationConfig {
  /// Skip recipients whose minimum alert threshold is above today's max.
  #[serde(default)]
  pub respect_threshold: bool,
}

// ─── Defaults ────────────────────────────────────────────────────────────────

fn default_store_path() -> PathBuf { PathBuf::from("magneto.db") }
fn default_feed_url() -> String {
  "https://services.swpc.noaa.gov/products/noaa-planetary-k-index-forecast.json".to_owned()
}
fn default_feed_timeout_secs() -> u64 { 10 }
fn default_api_base() -> String { "https://api.telegram.org".to_owned() }
fn default_parse_mode() -> Option<String> { Some("Markdown".to_owned()) }
fn default_send_timeout_secs() -> u64 { 5 }
fn default_poll_timeout_secs() -> u64 { 30 }
fn default_host() -> String { "0.0.0.0".to_owned() }
fn default_port() -> u16 { 8443 }
fn default_utc_offset_hours() -> i32 { 3 }
fn default_notifications_cron() -> String { "0 8 * * *".to_owned() }
fn default_survey_cron() -> String { "0 20 * * *".to_owned() }

impl Default for TelegramConfig {
  fn default() -> Self {
    Self {
      api_base:          default_api_base(),
      parse_mode:        default_parse_mode(),
      send_timeout_secs: default_send_timeout_secs(),
      poll_timeout_secs: default_poll_timeout_secs(),
      webhook:           None,
    }
  }
}

impl Default for ScheduleConfig {
  fn default() -> Self {
    Self {
      utc_offset_hours:   default_utc_offset_hours(),
      notifications_cron: default_notifications_cron(),
      survey_cron:        default_survey_cron(),
    }
  }
}

// ─── Accessors ───────────────────────────────────────────────────────────────

impl BotConfig {
  /// A configuration with every optional key at its default.
  pub fn new(bot_token: impl Into<String>) -> Self {
    Self {
      bot_token:         bot_token.into(),
      store_path:        default_store_path(),
      feed_url:          default_feed_url(),
      feed_timeout_secs: default_feed_timeout_secs(),
      telegram:          TelegramConfig::default(),
      schedule:          ScheduleConfig::default(),
      notifications:     NotificationConfig::default(),
    }
  }

  /// Read `path` (if it exists) and overlay `MAGNETO_*` environment variables.
  pub fn load(path: impl Into<PathBuf>) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path.into()).required(false))
      .add_source(
        config::Environment::with_prefix(ENV_PREFIX)
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()?
      .try_deserialize()
  }

  pub fn feed_timeout(&self) -> Duration { Duration::from_secs(self.feed_timeout_secs) }
}

impl TelegramConfig {
  pub fn send_timeout(&self) -> Duration { Duration::from_secs(self.send_timeout_secs) }

  pub fn poll_timeout(&self) -> Duration { Duration::from_secs(self.poll_timeout_secs) }
}

impl ScheduleConfig {
  pub fn utc_offset(&self) -> Result<FixedOffset> {
    self
      .utc_offset_hours
      .checked_mul(3600)
      .and_then(FixedOffset::east_opt)
      .ok_or_else(|| {
        Error::Config(format!("utc_offset_hours out of range: {}", self.utc_offset_hours))
      })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_fill_missing_keys() {
    let cfg: BotConfig = serde_json::from_value(serde_json::json!({ "bot_token": "t" })).unwrap();
    assert_eq!(cfg.bot_token, "t");
    assert_eq!(cfg.feed_timeout(), Duration::from_secs(10));
    assert_eq!(cfg.telegram.parse_mode.as_deref(), Some("Markdown"));
    assert_eq!(cfg.telegram.send_timeout(), Duration::from_secs(5));
    assert!(cfg.telegram.webhook.is_none());
    assert_eq!(cfg.schedule.notifications_cron, "0 8 * * *");
    assert_eq!(cfg.schedule.survey_cron, "0 20 * * *");
    assert!(!cfg.notifications.respect_threshold);
  }

  #[test]
  fn utc_offset_is_validated() {
    let mut schedule = ScheduleConfig::default();
    assert_eq!(schedule.utc_offset().unwrap().local_minus_utc(), 3 * 3600);

    schedule.utc_offset_hours = -5;
    assert_eq!(schedule.utc_offset().unwrap().local_minus_utc(), -5 * 3600);

    schedule.utc_offset_hours = 30;
    assert!(matches!(schedule.utc_offset(), Err(Error::Config(_))));
  }

  #[test]
  fn webhook_section_parses() {
    let cfg: BotConfig = serde_json::from_value(serde_json::json!({
      "telegram": { "webhook": { "public_url": "https://bot.example.org/telegram/webhook" } }
    }))
    .unwrap();
    let hook = cfg.telegram.webhook.unwrap();
    assert_eq!(hook.port, 8443);
    assert_eq!(hook.host, "0.0.0.0");
    assert!(hook.secret_token.is_none());
  }
}
