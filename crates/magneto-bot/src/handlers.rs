//! Interactive intake: `/start` and the inline-menu button presses.

use chrono::Utc;
use magneto_core::{
  store::PreferenceStore,
  transport::{MessageRef, Transport},
  user::{ChatId, MAX_ALERT_THRESHOLD, MIN_ALERT_THRESHOLD, PreferenceField, UserPreference},
};

use crate::{
  App, Error, Result, forecast,
  keyboards::{self, Callback, ThresholdStep},
  source::ForecastSource,
  telegram::{CallbackQuery, Message, Update},
  texts,
};

/// Route one update. Errors are returned to the intake loop, which logs them;
/// a failed update never stops the loop.
pub async fn handle_update<S, T, F>(app: &App<S, T, F>, update: Update) -> Result<()>
where
  S: PreferenceStore + 'static,
  T: Transport + 'static,
  F: ForecastSource + 'static,
{
  if let Some(query) = update.callback_query {
    handle_callback(app, query).await
  } else if let Some(message) = update.message {
    handle_message(app, message).await
  } else {
    tracing::debug!(update_id = update.update_id, "ignoring update");
    Ok(())
  }
}

// ─── Messages ────────────────────────────────────────────────────────────────

async fn handle_message<S, T, F>(app: &App<S, T, F>, message: Message) -> Result<()>
where
  S: PreferenceStore + 'static,
  T: Transport + 'static,
  F: ForecastSource + 'static,
{
  let chat_id = ChatId(message.chat.id);
  let text = message.text.as_deref().unwrap_or_default();

  if is_command(text, "start") {
    let name = message.from.as_ref().map_or("", |s| s.display_name());
    app
      .store
      .create_user_if_absent(chat_id, name)
      .await
      .map_err(Error::store)?;
    send(app, chat_id, texts::START, &keyboards::main_menu()).await
  } else if is_command(text, "menu") {
    send(app, chat_id, texts::MAIN_MENU, &keyboards::main_menu()).await
  } else {
    tracing::debug!(%chat_id, "ignoring free-text message");
    Ok(())
  }
}

/// `/name` or `/name@botname`, optionally followed by arguments.
fn is_command(text: &str, name: &str) -> bool {
  let Some(head) = text.split_whitespace().next() else {
    return false;
  };
  let Some(command) = head.strip_prefix('/') else {
    return false;
  };
  command.split('@').next() == Some(name)
}

// ─── Callbacks ───────────────────────────────────────────────────────────────

async fn handle_callback<S, T, F>(app: &App<S, T, F>, query: CallbackQuery) -> Result<()>
where
  S: PreferenceStore + 'static,
  T: Transport + 'static,
  F: ForecastSource + 'static,
{
  if let Err(e) = app.transport.acknowledge(&query.id).await {
    tracing::debug!(error = %e, "callback acknowledgement failed");
  }

  let Some(message) = query.message.as_ref().map(Message::reference) else {
    tracing::debug!(callback_id = %query.id, "callback without a message");
    return Ok(());
  };
  let data = query.data.as_deref().unwrap_or_default();
  let Some(callback) = Callback::parse(data)? else {
    tracing::debug!(data, "ignoring unknown callback");
    return Ok(());
  };

  let chat_id = ChatId(query.from.id);
  tracing::debug!(%chat_id, data, "callback");

  match callback {
    Callback::ForecastToday => show_forecast(app, message, 0).await,
    Callback::ForecastTomorrow => show_forecast(app, message, 1).await,
    Callback::BackToMain => edit(app, message, texts::MAIN_MENU, &keyboards::main_menu()).await,
    Callback::Settings => {
      let pref = preference_or_register(app, chat_id, query.from.display_name()).await?;
      show_settings(app, message, &pref, None).await
    }
    Callback::Toggle(field) => toggle(app, message, chat_id, query.from.display_name(), field).await,
    Callback::Threshold(step) => {
      let pref = preference_or_register(app, chat_id, query.from.display_name()).await?;
      step_threshold(app, message, chat_id, pref, step).await
    }
    Callback::Survey(tag) => record_survey(app, message, chat_id, &tag).await,
  }
}

async fn show_forecast<S, T, F>(app: &App<S, T, F>, message: MessageRef, days_ahead: u32) -> Result<()>
where
  S: PreferenceStore + 'static,
  T: Transport + 'static,
  F: ForecastSource + 'static,
{
  let today = Utc::now().date_naive();
  let text = forecast::forecast_text(app.source.as_ref(), today, days_ahead).await;
  edit(app, message, &text, &keyboards::back_to_main()).await
}

/// Users who pressed a menu button without ever sending `/start` (or whose
/// record predates a store reset) are registered on the spot.
async fn preference_or_register<S, T, F>(
  app: &App<S, T, F>,
  chat_id: ChatId,
  display_name: &str,
) -> Result<UserPreference>
where
  S: PreferenceStore + 'static,
  T: Transport + 'static,
  F: ForecastSource + 'static,
{
  if let Some(pref) = app.store.get_preference(chat_id).await.map_err(Error::store)? {
    return Ok(pref);
  }
  app
    .store
    .create_user_if_absent(chat_id, display_name)
    .await
    .map_err(Error::store)?;
  app
    .store
    .get_preference(chat_id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| magneto_core::Error::UserNotFound(chat_id).into())
}

async fn show_settings<S, T, F>(
  app: &App<S, T, F>,
  message: MessageRef,
  pref: &UserPreference,
  notice: Option<&str>,
) -> Result<()>
where
  S: PreferenceStore + 'static,
  T: Transport + 'static,
  F: ForecastSource + 'static,
{
  let threshold_active = app.config.notifications.respect_threshold;
  let text = texts::settings(pref, threshold_active, notice);
  edit(app, message, &text, &keyboards::settings(pref, threshold_active)).await
}

async fn toggle<S, T, F>(
  app: &App<S, T, F>,
  message: MessageRef,
  chat_id: ChatId,
  display_name: &str,
  field: PreferenceField,
) -> Result<()>
where
  S: PreferenceStore + 'static,
  T: Transport + 'static,
  F: ForecastSource + 'static,
{
  preference_or_register(app, chat_id, display_name).await?;
  app.store.toggle(chat_id, field).await.map_err(Error::store)?;
  let pref = preference_or_register(app, chat_id, display_name).await?;
  show_settings(app, message, &pref, None).await
}

async fn step_threshold<S, T, F>(
  app: &App<S, T, F>,
  message: MessageRef,
  chat_id: ChatId,
  pref: UserPreference,
  step: ThresholdStep,
) -> Result<()>
where
  S: PreferenceStore + 'static,
  T: Transport + 'static,
  F: ForecastSource + 'static,
{
  let current = pref.min_alert_threshold;
  let next = match step {
    ThresholdStep::Up if current >= MAX_ALERT_THRESHOLD => None,
    ThresholdStep::Down if current <= MIN_ALERT_THRESHOLD => None,
    ThresholdStep::Up => Some(current + 1),
    ThresholdStep::Down => Some(current - 1),
  };

  let Some(next) = next else {
    let notice = match step {
      ThresholdStep::Up => texts::THRESHOLD_AT_MAX,
      ThresholdStep::Down => texts::THRESHOLD_AT_MIN,
    };
    return show_settings(app, message, &pref, Some(notice)).await;
  };

  let pref = app
    .store
    .set_threshold(chat_id, next)
    .await
    .map_err(Error::store)?;
  tracing::info!(%chat_id, threshold = next, "alert threshold changed");
  show_settings(app, message, &pref, None).await
}

async fn record_survey<S, T, F>(
  app: &App<S, T, F>,
  message: MessageRef,
  chat_id: ChatId,
  tag: &str,
) -> Result<()>
where
  S: PreferenceStore + 'static,
  T: Transport + 'static,
  F: ForecastSource + 'static,
{
  let today = Utc::now().date_naive();
  let kp = match forecast::today_max(app.source.as_ref(), today).await {
    Ok(kp) => Some(kp),
    Err(e) => {
      tracing::warn!(%chat_id, error = %e, "recording survey answer without index value");
      None
    }
  };

  app
    .store
    .record_survey_response(chat_id, tag, kp)
    .await
    .map_err(Error::store)?;
  edit(app, message, texts::GRATITUDE, &keyboards::main_menu()).await
}

// ─── Transport helpers ───────────────────────────────────────────────────────

async fn send<S, T, F>(
  app: &App<S, T, F>,
  chat_id: ChatId,
  text: &str,
  markup: &magneto_core::keyboard::InlineKeyboard,
) -> Result<()>
where
  T: Transport + 'static,
{
  app
    .transport
    .send_message(chat_id, text, Some(markup))
    .await
    .map_err(Error::transport)?;
  Ok(())
}

async fn edit<S, T, F>(
  app: &App<S, T, F>,
  message: MessageRef,
  text: &str,
  markup: &magneto_core::keyboard::InlineKeyboard,
) -> Result<()>
where
  T: Transport + 'static,
{
  app
    .transport
    .edit_message(message, text, Some(markup))
    .await
    .map_err(Error::transport)
}
