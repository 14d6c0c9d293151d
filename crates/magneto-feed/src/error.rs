//! Error types for the forecast pipeline.

use chrono::NaiveDate;
use thiserror::Error;

use crate::render::format_date;

#[derive(Debug, Error)]
pub enum Error {
  /// Network or HTTP failure while fetching the upstream feed.
  #[error("forecast feed unavailable: {0}")]
  FeedUnavailable(String),

  /// The payload is not an array of rows, or has no data rows.
  #[error("malformed forecast payload: {0}")]
  MalformedPayload(String),

  #[error("required columns not found in header {headers:?}")]
  SchemaMismatch { headers: Vec<String> },

  #[error("no observations for {0}")]
  NoDataForDate(NaiveDate),

  #[error("maximum requested over an empty observation set")]
  EmptyMaxQuery,
}

impl Error {
  /// The text shown to a user in place of a report when this error occurs.
  pub fn user_message(&self) -> String {
    match self {
      Self::FeedUnavailable(reason) => {
        format!("❌ Failed to load forecast data: {reason}")
      }
      Self::MalformedPayload(_) => {
        "❌ Empty or malformed response from the forecast service.".to_string()
      }
      // Header names go to the log only; they are not Markdown-safe.
      Self::SchemaMismatch { .. } => {
        "❌ Required columns not found in the forecast feed.".to_string()
      }
      Self::NoDataForDate(date) => {
        format!("⚠️ Data for {} has not been published yet.", format_date(*date))
      }
      Self::EmptyMaxQuery => "⚠️ No observations to summarise.".to_string(),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn schema_mismatch_keeps_headers_out_of_user_text() {
    let err = Error::SchemaMismatch {
      headers: vec!["time_tag".to_string(), "kp_*index".to_string(), "`raw`".to_string()],
    };

    let shown = err.user_message();
    assert!(shown.contains("Required columns not found"), "{shown}");
    for fragment in ["time_tag", "kp_*index", "`raw`", "_", "*", "`", "["] {
      assert!(!shown.contains(fragment), "{shown:?} leaks {fragment:?}");
    }
    // The log line still names them.
    assert!(err.to_string().contains("kp_*index"));
  }

  #[test]
  fn user_messages_are_single_line() {
    let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    for err in [
      Error::FeedUnavailable("timeout".to_string()),
      Error::MalformedPayload("row 2".to_string()),
      Error::SchemaMismatch { headers: vec![] },
      Error::NoDataForDate(date),
      Error::EmptyMaxQuery,
    ] {
      assert!(!err.user_message().contains('\n'), "{err:?}");
    }
  }
}
