//! Calendar-day selection over a parsed series.
//!
//! Days are UTC calendar days. No other time zone is involved.

use chrono::{Days, NaiveDate};

use crate::observation::Observation;

/// `today` shifted forward by `days_ahead` (0 = today, 1 = tomorrow).
pub fn target_date(today: NaiveDate, days_ahead: u32) -> NaiveDate {
  today
    .checked_add_days(Days::new(u64::from(days_ahead)))
    .unwrap_or(NaiveDate::MAX)
}

/// Observations whose UTC date is `date`, in their original order.
pub fn on_date(observations: &[Observation], date: NaiveDate) -> Vec<Observation> {
  observations
    .iter()
    .filter(|o| o.timestamp.date_naive() == date)
    .copied()
    .collect()
}

/// Observations falling on `today + days_ahead`. Empty when nothing matches.
pub fn filter_day(
  observations: &[Observation],
  today: NaiveDate,
  days_ahead: u32,
) -> Vec<Observation> {
  on_date(observations, target_date(today, days_ahead))
}
