//! Typed observations produced by the parser.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a row is a measured value or a forward-looking estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
  Observed,
  Forecast,
  #[default]
  Unknown,
}

impl SourceKind {
  /// Interpret the free-text status cell of a feed row.
  pub fn from_cell(cell: &str) -> Self {
    let cell = cell.to_lowercase();
    if cell.contains("obs") || cell.contains("real") {
      Self::Observed
    } else if ["forecast", "pred", "est"].iter().any(|m| cell.contains(m)) {
      Self::Forecast
    } else {
      Self::Unknown
    }
  }
}

/// One point of the index time series. `timestamp` is always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
  pub timestamp:   DateTime<Utc>,
  pub index_value: f64,
  pub source_kind: SourceKind,
}
