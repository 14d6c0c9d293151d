//! Inline menus and the callback payloads their buttons carry.
//!
//! Payload grammar: a bare action (`settings`, `forecast_today`, …) or
//! `<action>:<argument>` (`toggle:survey`, `threshold:inc`, `survey:weakness`).

use magneto_core::{
  keyboard::{InlineButton, InlineKeyboard},
  user::{PreferenceField, UserPreference},
};

// ─── Callbacks ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdStep {
  Up,
  Down,
}

/// A decoded button press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
  ForecastToday,
  ForecastTomorrow,
  Settings,
  BackToMain,
  Toggle(PreferenceField),
  Threshold(ThresholdStep),
  /// A survey answer; the tag is stored verbatim.
  Survey(String),
}

impl Callback {
  /// Decode a payload. `Ok(None)` means the payload is not ours (stale
  /// buttons from an older menu layout); a known action with a bad argument is
  /// an error.
  pub fn parse(data: &str) -> Result<Option<Self>, magneto_core::Error> {
    let data = data.trim();
    let parsed = match data.split_once(':') {
      None => match data {
        "forecast_today" => Self::ForecastToday,
        "forecast_tomorrow" => Self::ForecastTomorrow,
        "settings" => Self::Settings,
        "back_to_main" => Self::BackToMain,
        _ => return Ok(None),
      },
      Some(("toggle", field)) => Self::Toggle(PreferenceField::parse(field)?),
      Some(("threshold", "inc")) => Self::Threshold(ThresholdStep::Up),
      Some(("threshold", "dec")) => Self::Threshold(ThresholdStep::Down),
      Some(("survey", tag)) if !tag.trim().is_empty() => Self::Survey(tag.trim().to_owned()),
      Some(_) => return Ok(None),
    };
    Ok(Some(parsed))
  }

  pub fn data(&self) -> String {
    match self {
      Self::ForecastToday => "forecast_today".to_owned(),
      Self::ForecastTomorrow => "forecast_tomorrow".to_owned(),
      Self::Settings => "settings".to_owned(),
      Self::BackToMain => "back_to_main".to_owned(),
      Self::Toggle(field) => format!("toggle:{field}"),
      Self::Threshold(ThresholdStep::Up) => "threshold:inc".to_owned(),
      Self::Threshold(ThresholdStep::Down) => "threshold:dec".to_owned(),
      Self::Survey(tag) => format!("survey:{tag}"),
    }
  }
}

fn button(text: impl Into<String>, callback: Callback) -> InlineButton {
  InlineButton::new(text, callback.data())
}

// ─── Menus ───────────────────────────────────────────────────────────────────

pub fn main_menu() -> InlineKeyboard {
  InlineKeyboard::new()
    .row([button("📅 Today", Callback::ForecastToday)])
    .row([button("🔮 Tomorrow", Callback::ForecastTomorrow)])
    .row([button("⚙️ Settings", Callback::Settings)])
}

pub fn back_to_main() -> InlineKeyboard {
  InlineKeyboard::new().row([button("⬅️ Back", Callback::BackToMain)])
}

/// Threshold buttons appear only when `threshold_active`.
pub fn settings(pref: &UserPreference, threshold_active: bool) -> InlineKeyboard {
  let toggle_label = |name: &str, on: bool| format!("{} {name}", if on { "🔔" } else { "🔕" });

  let mut kb = InlineKeyboard::new()
    .row([button(
      toggle_label("Morning alerts", pref.notifications_enabled),
      Callback::Toggle(PreferenceField::Notifications),
    )])
    .row([button(
      toggle_label("Evening survey", pref.survey_enabled),
      Callback::Toggle(PreferenceField::Survey),
    )]);
  if threshold_active {
    kb = kb.row([
      button("➖ Threshold", Callback::Threshold(ThresholdStep::Down)),
      button("➕ Threshold", Callback::Threshold(ThresholdStep::Up)),
    ]);
  }
  kb.row([button("⬅️ Back", Callback::BackToMain)])
}

/// Answers offered by the evening survey, as `(label, tag)`.
pub const SURVEY_ANSWERS: [(&str, &str); 4] = [
  ("😊 All good", "all_good"),
  ("🥱 Weakness", "weakness"),
  ("🤕 Headache", "headache"),
  ("💓 Pressure", "pressure"),
];

pub fn survey() -> InlineKeyboard {
  let [a, b, c, d] = SURVEY_ANSWERS.map(|(label, tag)| button(label, Callback::Survey(tag.to_owned())));
  InlineKeyboard::new().row([a, b]).row([c, d])
}
