//! Severity tiers for the planetary K-index.
//!
//! Buckets are half-open `[lower, upper)` and cover the whole number line:
//!
//! | Tier            | Kp       | NOAA |
//! |-----------------|----------|------|
//! | `Calm`          | `< 4`    |      |
//! | `Unsettled`     | `[4, 5)` |      |
//! | `MinorStorm`    | `[5, 6)` | G1   |
//! | `ModerateStorm` | `[6, 7)` | G2   |
//! | `StrongStorm`   | `[7, 8)` | G3   |
//! | `SevereStorm`   | `[8, 9)` | G4   |
//! | `ExtremeStorm`  | `≥ 9`    | G5   |

use serde::{Deserialize, Serialize};

use crate::observation::SourceKind;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SeverityTier {
  Calm,
  Unsettled,
  MinorStorm,
  ModerateStorm,
  StrongStorm,
  SevereStorm,
  ExtremeStorm,
}

impl SeverityTier {
  /// Every tier, lowest first.
  pub const ALL: [Self; 7] = [
    Self::Calm,
    Self::Unsettled,
    Self::MinorStorm,
    Self::ModerateStorm,
    Self::StrongStorm,
    Self::SevereStorm,
    Self::ExtremeStorm,
  ];

  /// Inclusive lower bound; `None` for the open-ended bottom tier.
  pub fn lower_bound(self) -> Option<f64> {
    match self {
      Self::Calm => None,
      Self::Unsettled => Some(4.0),
      Self::MinorStorm => Some(5.0),
      Self::ModerateStorm => Some(6.0),
      Self::StrongStorm => Some(7.0),
      Self::SevereStorm => Some(8.0),
      Self::ExtremeStorm => Some(9.0),
    }
  }

  pub fn emoji(self) -> &'static str {
    match self {
      Self::Calm => "🟢",
      Self::Unsettled => "🟡",
      Self::MinorStorm => "🟠",
      Self::ModerateStorm => "🔴",
      Self::StrongStorm => "⚫",
      Self::SevereStorm => "🟣",
      Self::ExtremeStorm => "💥",
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      Self::Calm => "calm",
      Self::Unsettled => "unsettled",
      Self::MinorStorm => "minor storm (G1)",
      Self::ModerateStorm => "moderate storm (G2)",
      Self::StrongStorm => "strong storm (G3)",
      Self::SevereStorm => "severe storm (G4)",
      Self::ExtremeStorm => "extreme storm (G5)",
    }
  }

  /// Long-form text for the daily summary line.
  pub fn advisory(self) -> &'static str {
    match self {
      Self::Calm => "Calm geomagnetic conditions.",
      Self::Unsettled => "Minor disturbances, most people will not notice them.",
      Self::MinorStorm => {
        "Minor storm (G1). Weather-sensitive people may feel slight discomfort."
      }
      Self::ModerateStorm => {
        "Moderate storm (G2). Headaches and fatigue are possible, take it easy."
      }
      Self::StrongStorm => {
        "Strong storm (G3). Avoid overexertion and keep an eye on blood pressure."
      }
      Self::SevereStorm => {
        "Severe storm (G4). Plan a quiet day and keep any prescribed medication at hand."
      }
      Self::ExtremeStorm => "Extreme geomagnetic activity!",
    }
  }
}

/// Map an index value to its tier. Total: values below 4, including negative
/// and NaN inputs, are `Calm`.
pub fn classify(value: f64) -> SeverityTier {
  SeverityTier::ALL
    .iter()
    .rev()
    .copied()
    .find(|tier| tier.lower_bound().is_some_and(|lower| value >= lower))
    .unwrap_or(SeverityTier::Calm)
}

// ─── Source confidence ───────────────────────────────────────────────────────

/// How far an individual reading can be trusted, shown next to each line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMarker {
  Confirmed,
  Forecast,
  Unknown,
}

impl SourceMarker {
  pub fn of(kind: SourceKind) -> Self {
    match kind {
      SourceKind::Observed => Self::Confirmed,
      SourceKind::Forecast => Self::Forecast,
      SourceKind::Unknown => Self::Unknown,
    }
  }

  pub fn symbol(self) -> &'static str {
    match self {
      Self::Confirmed => "☑️",
      Self::Forecast => "🌓",
      Self::Unknown => "—",
    }
  }
}
