//! Transport-neutral inline action menus attached to outgoing messages.

use serde::{Deserialize, Serialize};

/// A single button that reports `callback_data` back when pressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
  pub text:          String,
  pub callback_data: String,
}

impl InlineButton {
  pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
    Self { text: text.into(), callback_data: callback_data.into() }
  }
}

/// Rows of buttons; serialises to the Telegram `reply_markup` object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboard {
  #[serde(rename = "inline_keyboard")]
  pub rows: Vec<Vec<InlineButton>>,
}

impl InlineKeyboard {
  pub fn new() -> Self { Self::default() }

  /// Append a row of buttons.
  pub fn row(mut self, buttons: impl IntoIterator<Item = InlineButton>) -> Self {
    self.rows.push(buttons.into_iter().collect());
    self
  }

  /// Append a row holding one button.
  pub fn button(self, text: impl Into<String>, callback_data: impl Into<String>) -> Self {
    self.row([InlineButton::new(text, callback_data)])
  }

  pub fn buttons(&self) -> impl Iterator<Item = &InlineButton> {
    self.rows.iter().flatten()
  }

  pub fn to_json(&self) -> serde_json::Value {
    serde_json::json!({ "inline_keyboard": self.rows })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn serialises_to_reply_markup_shape() {
    let kb = InlineKeyboard::new()
      .button("Settings", "settings")
      .row([InlineButton::new("A", "a"), InlineButton::new("B", "b")]);

    let value = serde_json::to_value(&kb).unwrap();
    assert_eq!(value, kb.to_json());
    assert_eq!(value["inline_keyboard"][0][0]["callback_data"], "settings");
    assert_eq!(value["inline_keyboard"][1][1]["text"], "B");
    assert_eq!(kb.buttons().count(), 3);
  }
}
