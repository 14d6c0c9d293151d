//! Tabular feed parser.
//!
//! Pipeline:
//!   serde_json::Value
//!     └─ rows_from_json()   → Vec<RawRow>
//!          └─ locate_columns()  → Columns   (header row)
//!               └─ parse_row()      → Option<Observation>   (data rows)
//!                    └─ stable sort by timestamp → Vec<Observation>
//!
//! Data rows that cannot be interpreted are dropped without error. The
//! upstream format drifts, and one bad row must not hide the rest of the day.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use crate::{
  RawRow,
  error::{Error, Result},
  observation::{Observation, SourceKind},
};

// ─── Payload → rows ──────────────────────────────────────────────────────────

/// Flatten the upstream JSON array-of-arrays into string cells.
///
/// Fails if the payload is not an array, holds fewer than two rows (a header
/// plus at least one data row), or its header is not an array. A data entry
/// that is not an array becomes an empty row, which [`parse`] then drops.
pub fn rows_from_json(payload: &Value) -> Result<Vec<RawRow>> {
  let rows = payload
    .as_array()
    .ok_or_else(|| Error::MalformedPayload("payload is not an array".to_string()))?;

  if rows.len() < 2 {
    return Err(Error::MalformedPayload(format!(
      "expected a header and at least one row, got {} row(s)",
      rows.len()
    )));
  }

  let header = rows[0]
    .as_array()
    .ok_or_else(|| Error::MalformedPayload("header row is not an array".to_string()))?;

  let mut out = Vec::with_capacity(rows.len());
  out.push(header.iter().map(cell_text).collect());
  out.extend(rows[1..].iter().map(|row| match row.as_array() {
    Some(cells) => cells.iter().map(cell_text).collect(),
    None => RawRow::new(),
  }));
  Ok(out)
}

fn cell_text(cell: &Value) -> String {
  match cell {
    Value::Null => String::new(),
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}

// ─── Header discovery ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Columns {
  pub time:   usize,
  pub index:  usize,
  pub source: Option<usize>,
}

impl Columns {
  /// A data row must reach this many cells to be admitted.
  fn required_len(&self) -> usize { self.time.max(self.index) + 1 }
}

fn find_column(header: &[String], markers: &[&str]) -> Option<usize> {
  header.iter().position(|h| {
    let h = h.to_lowercase();
    markers.iter().any(|m| h.contains(m))
  })
}

/// Locate columns by case-insensitive substring, never by position.
pub(crate) fn locate_columns(header: &[String]) -> Result<Columns> {
  let time = find_column(header, &["time"]);
  let index = find_column(header, &["kp"]);

  match (time, index) {
    (Some(time), Some(index)) => Ok(Columns {
      time,
      index,
      source: find_column(header, &["obs", "forecast", "status"]),
    }),
    _ => Err(Error::SchemaMismatch { headers: header.to_vec() }),
  }
}

// ─── Cell parsers ────────────────────────────────────────────────────────────

/// Offset-less ISO-8601 variants; these are read as UTC.
const NAIVE_ISO_FORMATS: &[&str] =
  &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

const SPACED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Accept ISO-8601 (with `Z`, an explicit offset, or no offset) and
/// `YYYY-MM-DD HH:MM:SS`. Offset-less values are taken to be UTC.
pub(crate) fn parse_timestamp(cell: &str) -> Option<DateTime<Utc>> {
  let cell = cell.trim();

  if cell.contains('T') {
    if let Ok(dt) = DateTime::parse_from_rfc3339(cell) {
      return Some(dt.with_timezone(&Utc));
    }
    return NAIVE_ISO_FORMATS
      .iter()
      .find_map(|fmt| NaiveDateTime::parse_from_str(cell, fmt).ok())
      .map(|naive| naive.and_utc());
  }

  NaiveDateTime::parse_from_str(cell, SPACED_FORMAT)
    .ok()
    .map(|naive| naive.and_utc())
}

/// A finite, non-negative number.
pub(crate) fn parse_index_value(cell: &str) -> Option<f64> {
  cell
    .trim()
    .parse::<f64>()
    .ok()
    .filter(|v| v.is_finite() && *v >= 0.0)
}

fn parse_row(row: &RawRow, columns: Columns) -> Option<Observation> {
  if row.len() < columns.required_len() {
    return None;
  }

  let time_cell = row[columns.time].trim();
  let index_cell = row[columns.index].trim();
  if time_cell.is_empty() || index_cell.is_empty() {
    return None;
  }

  let timestamp = parse_timestamp(time_cell)?;
  let index_value = parse_index_value(index_cell)?;
  let source_kind = columns
    .source
    .and_then(|i| row.get(i))
    .map(|cell| SourceKind::from_cell(cell))
    .unwrap_or_default();

  Some(Observation { timestamp, index_value, source_kind })
}

// ─── Entry point ─────────────────────────────────────────────────────────────

/// Parse a header row followed by data rows into time-ordered observations.
pub fn parse(rows: &[RawRow]) -> Result<Vec<Observation>> {
  let (header, data) = rows
    .split_first()
    .ok_or_else(|| Error::MalformedPayload("missing header row".to_string()))?;

  let columns = locate_columns(header)?;

  let mut observations: Vec<Observation> =
    data.iter().filter_map(|row| parse_row(row, columns)).collect();

  // `sort_by` is stable: equal timestamps keep their feed order.
  observations.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
  Ok(observations)
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use serde_json::json;

  use super::*;

  fn row(cells: &[&str]) -> RawRow { cells.iter().map(|c| c.to_string()).collect() }

  fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
  }

  // ── Header discovery ──────────────────────────────────────────────────────

  #[test]
  fn locates_columns_in_any_order_and_case() {
    let permutations = [
      (row(&["time_tag", "kp_index", "observed"]), (0, 1, Some(2))),
      (row(&["KP", "Observed", "TIME_TAG"]), (2, 0, Some(1))),
      (row(&["status", "Estimated Kp", "Time"]), (2, 1, Some(0))),
      (row(&["Kp", "noaa_scale", "timeTag"]), (2, 0, None)),
    ];

    for (header, (time, index, source)) in permutations {
      let cols = locate_columns(&header).unwrap();
      assert_eq!(cols, Columns { time, index, source }, "header {header:?}");
    }
  }

  #[test]
  fn missing_mandatory_column_is_schema_mismatch() {
    for header in [row(&["time_tag", "observed"]), row(&["kp", "observed"]), row(&[])] {
      let err = locate_columns(&header).unwrap_err();
      assert!(
        matches!(err, Error::SchemaMismatch { ref headers } if *headers == header),
        "{err:?}"
      );
    }
  }

  // ── Cells ─────────────────────────────────────────────────────────────────

  #[test]
  fn timestamp_formats() {
    let expected = utc(2025, 1, 1, 3);
    assert_eq!(parse_timestamp("2025-01-01T03:00:00Z"), Some(expected));
    assert_eq!(parse_timestamp("2025-01-01T03:00:00"), Some(expected));
    assert_eq!(parse_timestamp("2025-01-01T06:00:00+03:00"), Some(expected));
    assert_eq!(parse_timestamp("2025-01-01T03:00:00.000"), Some(expected));
    assert_eq!(parse_timestamp(" 2025-01-01 03:00:00 "), Some(expected));
    assert_eq!(parse_timestamp("01.01.2025 03:00"), None);
    assert_eq!(parse_timestamp("2025-01-01"), None);
    assert_eq!(parse_timestamp("yesterday"), None);
  }

  #[test]
  fn offset_timestamps_are_normalised_to_utc_date() {
    // 01:00 on Jan 2nd in UTC+3 is still Jan 1st in UTC.
    let ts = parse_timestamp("2025-01-02T01:00:00+03:00").unwrap();
    assert_eq!(ts, Utc.with_ymd_and_hms(2025, 1, 1, 22, 0, 0).unwrap());
  }

  #[test]
  fn index_values() {
    assert_eq!(parse_index_value("5.33"), Some(5.33));
    assert_eq!(parse_index_value(" 2 "), Some(2.0));
    assert_eq!(parse_index_value("n/a"), None);
    assert_eq!(parse_index_value("-1"), None);
    assert_eq!(parse_index_value("NaN"), None);
    assert_eq!(parse_index_value("inf"), None);
  }

  // ── Rows ──────────────────────────────────────────────────────────────────

  #[test]
  fn unparseable_rows_are_dropped_silently() {
    let rows = vec![
      row(&["time_tag", "kp", "observed"]),
      row(&["2025-01-01 00:00:00", "2.33", "observed"]),
      row(&["not a time", "3", "observed"]),
      row(&["2025-01-01 06:00:00", "high", "predicted"]),
      row(&["", "3", "predicted"]),
      row(&["2025-01-01 09:00:00", "", "predicted"]),
      row(&["2025-01-01 12:00:00"]),
      row(&["2025-01-01 15:00:00", "4"]),
    ];

    let obs = parse(&rows).unwrap();
    assert_eq!(obs.len(), 2);
    assert_eq!(obs[0].index_value, 2.33);
    assert_eq!(obs[0].source_kind, SourceKind::Observed);
    // Short rows still parse as long as the mandatory cells are present.
    assert_eq!(obs[1].index_value, 4.0);
    assert_eq!(obs[1].source_kind, SourceKind::Unknown);
  }

  #[test]
  fn output_is_sorted_and_stable() {
    let rows = vec![
      row(&["kp", "time_tag"]),
      row(&["3", "2025-01-01 06:00:00"]),
      row(&["1", "2025-01-01 00:00:00"]),
      row(&["7", "2025-01-01 06:00:00"]),
      row(&["5", "2025-01-01T03:00:00Z"]),
    ];

    let values: Vec<f64> = parse(&rows).unwrap().iter().map(|o| o.index_value).collect();
    assert_eq!(values, vec![1.0, 5.0, 3.0, 7.0]);
  }

  #[test]
  fn header_only_payload_parses_to_nothing() {
    assert!(parse(&[row(&["time_tag", "kp"])]).unwrap().is_empty());
    assert!(matches!(parse(&[]), Err(Error::MalformedPayload(_))));
  }

  // ── JSON ──────────────────────────────────────────────────────────────────

  #[test]
  fn rows_from_json_stringifies_cells() {
    let payload = json!([
      ["time_tag", "kp", "observed", "noaa_scale"],
      ["2025-01-01 00:00:00", 2.67, "observed", null]
    ]);
    let rows = rows_from_json(&payload).unwrap();
    assert_eq!(rows[1], row(&["2025-01-01 00:00:00", "2.67", "observed", ""]));
  }

  #[test]
  fn rows_from_json_rejects_bad_shapes() {
    for payload in [
      json!(null),
      json!({"kp": 3}),
      json!([]),
      json!([["time_tag", "kp"]]),
      json!(["time_tag,kp", ["2025-01-01 00:00:00", "1"]]),
    ] {
      assert!(
        matches!(rows_from_json(&payload), Err(Error::MalformedPayload(_))),
        "{payload}"
      );
    }
  }

  #[test]
  fn non_array_data_entries_become_empty_rows() {
    let payload = json!([
      ["time_tag", "kp"],
      ["2025-01-01 00:00:00", "2"],
      "2025-01-01 03:00:00",
      {"kp": 9},
      ["2025-01-01 06:00:00", "4"]
    ]);

    let rows = rows_from_json(&payload).unwrap();
    assert_eq!(rows.len(), 5);
    assert!(rows[2].is_empty() && rows[3].is_empty());

    let values: Vec<f64> = parse(&rows).unwrap().iter().map(|o| o.index_value).collect();
    assert_eq!(values, vec![2.0, 4.0]);
  }
}
