//! Scheduled broadcasts: the morning alert and the evening survey.
//!
//! Each run reads the recipient list and (for alerts) the forecast afresh,
//! then sends one message per recipient in order. A failed or slow send is
//! logged and counted; it never prevents delivery to the remaining
//! recipients. Nothing is retried.

use chrono::{NaiveDate, Utc};
use magneto_core::{
  keyboard::InlineKeyboard,
  store::PreferenceStore,
  transport::Transport,
  user::{ChatId, RecipientFilter},
};

use crate::{App, Error, Result, forecast, keyboards, source::ForecastSource, texts};

/// Outcome of one broadcast run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
  /// Recipients a send was attempted for.
  pub attempted: usize,
  pub delivered: usize,
  /// Recipients whose send failed or timed out.
  pub failed:    Vec<ChatId>,
  /// Recipients left out because today's max is below their threshold.
  pub skipped:   usize,
}

/// Send today's alert to every user with notifications enabled.
pub async fn notifications<S, T, F>(app: &App<S, T, F>) -> Result<DispatchReport>
where
  S: PreferenceStore + 'static,
  T: Transport + 'static,
  F: ForecastSource + 'static,
{
  notifications_on(app, Utc::now().date_naive()).await
}

/// [`notifications`] for an explicit UTC day.
///
/// When today's maximum cannot be computed the run is aborted before any
/// message goes out.
pub async fn notifications_on<S, T, F>(app: &App<S, T, F>, today: NaiveDate) -> Result<DispatchReport>
where
  S: PreferenceStore + 'static,
  T: Transport + 'static,
  F: ForecastSource + 'static,
{
  let recipients = app
    .store
    .recipient_ids(RecipientFilter::Notifications)
    .await
    .map_err(Error::store)?;
  if recipients.is_empty() {
    tracing::info!("no alert recipients");
    return Ok(DispatchReport::default());
  }

  let kp = forecast::today_max(app.source.as_ref(), today)
    .await
    .inspect_err(|e| tracing::error!(error = %e, %today, "alert run aborted"))?;

  let text = texts::alert(kp);
  let markup = keyboards::main_menu();
  let respect_threshold = app.config.notifications.respect_threshold;

  let mut report = DispatchReport::default();
  for chat_id in recipients {
    if respect_threshold && !wants_alert(app, chat_id, kp).await {
      report.skipped += 1;
      continue;
    }
    deliver(app, chat_id, &text, &markup, &mut report).await;
  }

  tracing::info!(
    kp,
    attempted = report.attempted,
    delivered = report.delivered,
    failed = report.failed.len(),
    skipped = report.skipped,
    "alert run finished"
  );
  Ok(report)
}

/// Send the survey prompt to every user with surveys enabled.
pub async fn survey<S, T, F>(app: &App<S, T, F>) -> Result<DispatchReport>
where
  S: PreferenceStore + 'static,
  T: Transport + 'static,
  F: ForecastSource + 'static,
{
  let recipients = app
    .store
    .recipient_ids(RecipientFilter::Survey)
    .await
    .map_err(Error::store)?;

  let markup = keyboards::survey();
  let mut report = DispatchReport::default();
  for chat_id in recipients {
    deliver(app, chat_id, texts::SURVEY_PROMPT, &markup, &mut report).await;
  }

  tracing::info!(
    attempted = report.attempted,
    delivered = report.delivered,
    failed = report.failed.len(),
    "survey run finished"
  );
  Ok(report)
}

/// A threshold lookup that fails counts as "wants the alert".
async fn wants_alert<S, T, F>(app: &App<S, T, F>, chat_id: ChatId, kp: f64) -> bool
where
  S: PreferenceStore + 'static,
{
  match app.store.get_preference(chat_id).await {
    Ok(Some(pref)) => pref.wants_alert(kp),
    Ok(None) => true,
    Err(e) => {
      tracing::warn!(%chat_id, error = %e, "threshold lookup failed");
      true
    }
  }
}

async fn deliver<S, T, F>(
  app: &App<S, T, F>,
  chat_id: ChatId,
  text: &str,
  markup: &InlineKeyboard,
  report: &mut DispatchReport,
) where
  T: Transport + 'static,
{
  report.attempted += 1;

  let send = app.transport.send_message(chat_id, text, Some(markup));
  let reason = match tokio::time::timeout(app.config.telegram.send_timeout(), send).await {
    Ok(Ok(_)) => {
      report.delivered += 1;
      return;
    }
    Ok(Err(e)) => e.to_string(),
    Err(_) => "timed out".to_owned(),
  };

  let err = Error::Delivery { chat_id, reason };
  tracing::warn!(error = %err, "broadcast delivery failed");
  report.failed.push(chat_id);
}
