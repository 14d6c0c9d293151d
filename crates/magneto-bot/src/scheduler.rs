//! Wall-clock triggers for the two daily broadcasts.
//!
//! Cron expressions are evaluated in the fixed offset from
//! [`ScheduleConfig`](crate::config::ScheduleConfig). Each job runs in its own
//! task and awaits its run before computing the next fire time, so a job
//! never overlaps itself.

use std::{future::Future, str::FromStr};

use chrono::{DateTime, FixedOffset, Utc};
use cron::Schedule;
use magneto_core::{store::PreferenceStore, transport::Transport};
use tokio::task::JoinHandle;

use crate::{
  App, Error, Result,
  dispatch::{self, DispatchReport},
  source::ForecastSource,
};

/// Accept standard 5-field cron by prepending a zero seconds field.
pub fn normalize_cron(expression: &str) -> String {
  let trimmed = expression.trim();
  if trimmed.split_whitespace().count() == 5 {
    format!("0 {trimmed}")
  } else {
    trimmed.to_owned()
  }
}

pub fn parse_schedule(expression: &str) -> Result<Schedule> {
  Schedule::from_str(&normalize_cron(expression)).map_err(|e| Error::Schedule {
    expression: expression.to_owned(),
    reason:     e.to_string(),
  })
}

/// First fire time strictly after `after`, reading the schedule in `offset`.
pub fn next_fire(
  schedule: &Schedule,
  offset: FixedOffset,
  after: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
  schedule
    .after(&after.with_timezone(&offset))
    .next()
    .map(|at| at.with_timezone(&Utc))
}

/// A named broadcast with its parsed schedule.
pub struct Job {
  pub name:     &'static str,
  pub schedule: Schedule,
}

/// Parse both schedules up front so a bad expression fails startup.
pub fn jobs(config: &crate::config::ScheduleConfig) -> Result<[Job; 2]> {
  Ok([
    Job { name: "notifications", schedule: parse_schedule(&config.notifications_cron)? },
    Job { name: "survey", schedule: parse_schedule(&config.survey_cron)? },
  ])
}

/// Spawn one task per broadcast. The tasks run until aborted.
pub fn spawn<S, T, F>(app: App<S, T, F>) -> Result<Vec<JoinHandle<()>>>
where
  S: PreferenceStore + 'static,
  T: Transport + 'static,
  F: ForecastSource + 'static,
{
  let offset = app.config.schedule.utc_offset()?;
  let [notifications, survey] = jobs(&app.config.schedule)?;

  let alert_app = app.clone();
  let alert = tokio::spawn(run_job(notifications, offset, move || {
    let app = alert_app.clone();
    async move { dispatch::notifications(&app).await }
  }));

  let survey_app = app;
  let survey = tokio::spawn(run_job(survey, offset, move || {
    let app = survey_app.clone();
    async move { dispatch::survey(&app).await }
  }));

  Ok(vec![alert, survey])
}

async fn run_job<M, Fut>(job: Job, offset: FixedOffset, mut run: M)
where
  M: FnMut() -> Fut + Send + 'static,
  Fut: Future<Output = Result<DispatchReport>> + Send + 'static,
{
  loop {
    let now = Utc::now();
    let Some(at) = next_fire(&job.schedule, offset, now) else {
      tracing::warn!(job = job.name, "schedule has no further fire times");
      return;
    };
    tracing::info!(job = job.name, next = %at.with_timezone(&offset), "next run scheduled");

    let wait = (at - now).to_std().unwrap_or_default();
    tokio::time::sleep(wait).await;

    match run().await {
      Ok(report) => tracing::info!(
        job = job.name,
        delivered = report.delivered,
        failed = report.failed.len(),
        "run finished"
      ),
      Err(e) => tracing::error!(job = job.name, error = %e, "run failed"),
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn minsk() -> FixedOffset { FixedOffset::east_opt(3 * 3600).unwrap() }

  #[test]
  fn five_field_expressions_gain_seconds() {
    assert_eq!(normalize_cron("0 8 * * *"), "0 0 8 * * *");
    assert_eq!(normalize_cron(" 30 0 20 * * * "), "30 0 20 * * *");
  }

  #[test]
  fn bad_expression_is_a_schedule_error() {
    assert!(matches!(
      parse_schedule("every morning"),
      Err(Error::Schedule { expression, .. }) if expression == "every morning"
    ));
  }

  #[test]
  fn fires_at_local_wall_clock() {
    let schedule = parse_schedule("0 8 * * *").unwrap();

    // 04:00 UTC is 07:00 local: next fire is 08:00 local the same day.
    let after = Utc.with_ymd_and_hms(2025, 1, 1, 4, 0, 0).unwrap();
    assert_eq!(
      next_fire(&schedule, minsk(), after),
      Some(Utc.with_ymd_and_hms(2025, 1, 1, 5, 0, 0).unwrap())
    );

    // Exactly at the fire time: the next one is a day later.
    let at = Utc.with_ymd_and_hms(2025, 1, 1, 5, 0, 0).unwrap();
    assert_eq!(
      next_fire(&schedule, minsk(), at),
      Some(Utc.with_ymd_and_hms(2025, 1, 2, 5, 0, 0).unwrap())
    );
  }

  #[test]
  fn default_jobs_parse() {
    let [alert, survey] = jobs(&crate::config::ScheduleConfig::default()).unwrap();
    assert_eq!(alert.name, "notifications");
    assert_eq!(survey.name, "survey");

    let after = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
    assert_eq!(
      next_fire(&survey.schedule, minsk(), after),
      Some(Utc.with_ymd_and_hms(2025, 1, 1, 17, 0, 0).unwrap())
    );
  }
}
