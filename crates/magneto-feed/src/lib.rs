//! Planetary K-index forecast pipeline for Magneto.
//!
//! Turns the upstream tabular feed into typed observations, selects a UTC
//! calendar day, classifies values into severity tiers and renders reports.
//! Pure synchronous; no HTTP or database dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use chrono::Utc;
//! use magneto_feed::forecast_for_day;
//!
//! let payload: serde_json::Value = serde_json::from_str(
//!   r#"[["time_tag","kp","observed"],["2025-01-01 03:00:00","5.33","observed"]]"#,
//! ).unwrap();
//! match forecast_for_day(&payload, Utc::now().date_naive(), 0) {
//!   Ok(day) => println!("{}", day.report()),
//!   Err(e) => println!("{}", e.user_message()),
//! }
//! ```

pub mod classify;
pub mod error;
pub mod filter;
pub mod observation;
pub mod parse;
pub mod render;

pub use classify::{SeverityTier, SourceMarker, classify};
pub use error::{Error, Result};
pub use filter::{filter_day, target_date};
pub use observation::{Observation, SourceKind};
pub use parse::{parse, rows_from_json};
pub use render::{RenderMode, Rendered, format_kp, max_value, render, report};

use chrono::NaiveDate;

/// One feed row: ordered string cells. The first row of a payload is the
/// header.
pub type RawRow = Vec<String>;

// ─── Day forecast ────────────────────────────────────────────────────────────

/// The non-empty, time-ordered observations of a single UTC day.
#[derive(Debug, Clone)]
pub struct DayForecast {
  pub date:         NaiveDate,
  pub observations: Vec<Observation>,
}

impl DayForecast {
  pub fn max_value(&self) -> Result<f64> { max_value(&self.observations) }

  pub fn report(&self) -> String { report(&self.observations, self.date) }
}

/// Run the full pipeline over a raw payload for `today + days_ahead`.
///
/// An empty selection is reported as [`Error::NoDataForDate`].
pub fn forecast_for_day(
  payload: &serde_json::Value,
  today: NaiveDate,
  days_ahead: u32,
) -> Result<DayForecast> {
  let rows = rows_from_json(payload)?;
  let all = parse(&rows)?;
  let date = target_date(today, days_ahead);
  let observations = filter::on_date(&all, date);

  if observations.is_empty() {
    return Err(Error::NoDataForDate(date));
  }
  Ok(DayForecast { date, observations })
}
