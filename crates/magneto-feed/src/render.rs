//! Human-readable daily report and the scalar maximum used by alerts.
//!
//! Output uses Telegram legacy Markdown (`*bold*`).

use chrono::NaiveDate;

use crate::{
  classify::{SourceMarker, classify},
  error::{Error, Result},
  observation::Observation,
};

/// What the caller wants back from [`render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
  /// The full multi-line report.
  Report,
  /// Only the day's maximum index value.
  MaxOnly,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
  Report(String),
  Max(f64),
}

/// Render `observations` for `date` in the requested mode.
///
/// `MaxOnly` over an empty set is an [`Error::EmptyMaxQuery`].
pub fn render(observations: &[Observation], date: NaiveDate, mode: RenderMode) -> Result<Rendered> {
  match mode {
    RenderMode::Report => Ok(Rendered::Report(report(observations, date))),
    RenderMode::MaxOnly => max_value(observations).map(Rendered::Max),
  }
}

/// The largest index value in `observations`.
pub fn max_value(observations: &[Observation]) -> Result<f64> {
  observations
    .iter()
    .map(|o| o.index_value)
    .reduce(f64::max)
    .ok_or(Error::EmptyMaxQuery)
}

/// The full report for one day, or the "not yet published" advisory when
/// there is nothing to show.
pub fn report(observations: &[Observation], date: NaiveDate) -> String {
  let Ok(max) = max_value(observations) else {
    return Error::NoDataForDate(date).user_message();
  };

  let mut lines = Vec::with_capacity(observations.len() + 4);
  lines.push(format!("🧲 *Geomagnetic conditions — {}*", format_date(date)));

  for obs in observations {
    let tier = classify(obs.index_value);
    lines.push(format!(
      "{} *{}* — Kp = {} → {} {}",
      tier.emoji(),
      obs.timestamp.format("%H:%M"),
      format_kp(obs.index_value),
      tier.label(),
      SourceMarker::of(obs.source_kind).symbol(),
    ));
  }

  let summary = classify(max);
  lines.push(String::new());
  lines.push(format!("{MAX_LINE_PREFIX}{}", format_kp(max)));
  lines.push(format!("{} {}", summary.emoji(), summary.advisory()));

  lines.join("\n")
}

pub(crate) const MAX_LINE_PREFIX: &str = "📌 *Max Kp for the day*: ";

/// Whole values print as integers, anything else truncated to one decimal.
///
/// Truncation keeps the shown value in the same tier as the real one: 4.96
/// prints as "4.9", never as "5.0".
pub fn format_kp(value: f64) -> String {
  // The epsilon absorbs binary error in `value * 10.0`. It must never lift the
  // shown value above the real one.
  let nudged = ((value * 10.0) + 1e-9).floor() / 10.0;
  let shown = if nudged > value { (value * 10.0).floor() / 10.0 } else { nudged };
  if shown.fract() == 0.0 {
    format!("{shown:.0}")
  } else {
    format!("{shown:.1}")
  }
}

/// `DD.MM.YYYY`, as shown to users.
pub fn format_date(date: NaiveDate) -> String { date.format("%d.%m.%Y").to_string() }

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};

  use super::*;
  use crate::{classify::SeverityTier, observation::SourceKind};

  fn date() -> NaiveDate { NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() }

  fn day(values: &[f64]) -> Vec<Observation> {
    values
      .iter()
      .enumerate()
      .map(|(i, v)| Observation {
        timestamp:   Utc.with_ymd_and_hms(2025, 1, 1, 3 * i as u32, 0, 0).unwrap(),
        index_value: *v,
        source_kind: if i < 2 { SourceKind::Observed } else { SourceKind::Forecast },
      })
      .collect()
  }

  /// Pull the number back out of the rendered maximum line.
  fn reparse_max(report: &str) -> f64 {
    report
      .lines()
      .find_map(|l| l.strip_prefix(MAX_LINE_PREFIX))
      .expect("max line present")
      .parse()
      .expect("numeric max")
  }

  #[test]
  fn max_only_returns_scalar() {
    let rendered = render(&day(&[2.0, 3.0, 6.0, 6.0, 3.0]), date(), RenderMode::MaxOnly).unwrap();
    assert_eq!(rendered, Rendered::Max(6.0));
  }

  #[test]
  fn max_only_on_empty_set_is_an_error() {
    assert!(matches!(render(&[], date(), RenderMode::MaxOnly), Err(Error::EmptyMaxQuery)));
    assert!(matches!(max_value(&[]), Err(Error::EmptyMaxQuery)));
  }

  #[test]
  fn report_round_trips_the_maximum() {
    let Rendered::Report(text) =
      render(&day(&[2.0, 3.0, 6.0, 6.0, 3.0]), date(), RenderMode::Report).unwrap()
    else {
      panic!("expected a report")
    };

    assert_eq!(reparse_max(&text), 6.0);
    assert_eq!(classify(reparse_max(&text)), SeverityTier::ModerateStorm);
    assert!(text.ends_with(SeverityTier::ModerateStorm.advisory()), "{text}");
  }

  #[test]
  fn report_layout() {
    let text = report(&day(&[2.0, 4.33, 5.0]), date());
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines[0], "🧲 *Geomagnetic conditions — 01.01.2025*");
    assert_eq!(lines[1], "🟢 *00:00* — Kp = 2 → calm ☑️");
    assert_eq!(lines[2], "🟡 *03:00* — Kp = 4.3 → unsettled ☑️");
    assert_eq!(lines[3], "🟠 *06:00* — Kp = 5 → minor storm (G1) 🌓");
    assert_eq!(lines[4], "");
    assert_eq!(lines[5], "📌 *Max Kp for the day*: 5");
    assert_eq!(lines[6], format!("🟠 {}", SeverityTier::MinorStorm.advisory()));
    assert_eq!(lines.len(), 7);
  }

  #[test]
  fn empty_report_is_an_advisory() {
    let text = report(&[], date());
    assert!(text.contains("01.01.2025"));
    assert!(text.contains("not been published"));
  }

  #[test]
  fn kp_formatting() {
    assert_eq!(format_kp(6.0), "6");
    assert_eq!(format_kp(5.33), "5.3");
    assert_eq!(format_kp(4.67), "4.6");
    assert_eq!(format_kp(2.3), "2.3");
    assert_eq!(format_kp(0.0), "0");
  }

  #[test]
  fn shown_value_never_crosses_a_tier_boundary() {
    assert_eq!(format_kp(4.96), "4.9");
    assert_eq!(format_kp(8.96), "8.9");
    assert_eq!(format_kp(5.999), "5.9");
    assert_eq!(format_kp(4.999_999_999_9), "4.9");

    for raw in [3.96, 4.96, 5.96, 6.96, 7.96, 8.96, 4.999, 4.999_999_999_9, 5.33, 9.0] {
      let shown: f64 = format_kp(raw).parse().unwrap();
      assert_eq!(classify(shown), classify(raw), "{raw} shown as {shown}");
    }
  }

  #[test]
  fn report_near_boundary_keeps_the_lower_tier() {
    let text = report(&day(&[2.0, 4.96]), date());

    assert_eq!(reparse_max(&text), 4.9);
    assert_eq!(classify(reparse_max(&text)), SeverityTier::Unsettled);
    assert!(text.contains("Kp = 4.9 → unsettled"), "{text}");
    assert!(text.ends_with(SeverityTier::Unsettled.advisory()), "{text}");
  }
}
