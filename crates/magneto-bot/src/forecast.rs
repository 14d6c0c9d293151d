//! The query path: fetch, parse, filter and render one day.

use chrono::NaiveDate;
use magneto_feed::DayForecast;

use crate::source::ForecastSource;

pub async fn fetch_day<F: ForecastSource>(
  source: &F,
  today: NaiveDate,
  days_ahead: u32,
) -> magneto_feed::Result<DayForecast> {
  let payload = source.fetch().await?;
  magneto_feed::forecast_for_day(&payload, today, days_ahead)
}

/// The report for `today + days_ahead`, or a user-facing explanation of why
/// there is none.
pub async fn forecast_text<F: ForecastSource>(
  source: &F,
  today: NaiveDate,
  days_ahead: u32,
) -> String {
  match fetch_day(source, today, days_ahead).await {
    Ok(day) => day.report(),
    Err(e) => {
      tracing::warn!(error = %e, days_ahead, "forecast unavailable");
      e.user_message()
    }
  }
}

/// Maximum index value forecast for `today`.
pub async fn today_max<F: ForecastSource>(source: &F, today: NaiveDate) -> magneto_feed::Result<f64> {
  fetch_day(source, today, 0).await?.max_value()
}
