//! User-facing message texts (Telegram Markdown).

use magneto_core::user::{MAX_ALERT_THRESHOLD, MIN_ALERT_THRESHOLD, UserPreference};
use magneto_feed::{classify, format_kp};

pub const START: &str = "👋 Hi! I track geomagnetic storms.\n\n\
  Every morning I send the day's peak Kp index, and every evening I ask how \
  you feel. Use the buttons below to check the forecast or change your settings.";

pub const MAIN_MENU: &str = "🧲 *Magneto*\n\nChoose an action:";

pub const SURVEY_PROMPT: &str = "📝 How are you feeling today?";

pub const GRATITUDE: &str = "🙏 Thanks! Your answer has been saved.";

pub const THRESHOLD_AT_MIN: &str = "⚠️ The threshold is already at its minimum.";

pub const THRESHOLD_AT_MAX: &str = "⚠️ The threshold is already at its maximum.";

/// The morning alert for a day whose peak index is `kp`.
pub fn alert(kp: f64) -> String {
  let tier = classify(kp);
  format!(
    "🌅 *Good morning!*\n\n📌 Today's max Kp: *{}*\n{} {}",
    format_kp(kp),
    tier.emoji(),
    tier.advisory(),
  )
}

fn on_off(enabled: bool) -> &'static str { if enabled { "ON ✅" } else { "OFF ❌" } }

/// The settings screen, optionally prefixed with a one-line notice.
///
/// The threshold line is shown only while alerts are gated on it.
pub fn settings(pref: &UserPreference, threshold_active: bool, notice: Option<&str>) -> String {
  let mut text = String::new();
  if let Some(notice) = notice {
    text.push_str(notice);
    text.push_str("\n\n");
  }
  text.push_str(&format!(
    "⚙️ *Settings*\n\n\
     🔔 Morning alerts: {}\n\
     📝 Evening survey: {}",
    on_off(pref.notifications_enabled),
    on_off(pref.survey_enabled),
  ));
  if threshold_active {
    text.push_str(&format!(
      "\n🧲 Alert threshold: Kp ≥ {} (range {MIN_ALERT_THRESHOLD}–{MAX_ALERT_THRESHOLD})",
      pref.min_alert_threshold,
    ));
  }
  text
}
