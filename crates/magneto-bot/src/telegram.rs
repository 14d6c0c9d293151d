//! Telegram Bot API client.
//!
//! Implements [`Transport`] over `sendMessage` / `editMessageText` /
//! `answerCallbackQuery`, and exposes `getUpdates` and webhook registration
//! for the intake loops. The bot token is part of every request URL, so
//! request errors are stripped of their URL before they leave this module.

use std::time::Duration;

use magneto_core::{
  keyboard::InlineKeyboard,
  transport::{MessageRef, Transport},
  user::ChatId,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};

use crate::{Error, Result, config::TelegramConfig};

// ─── Bot API types ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
  pub update_id:      i64,
  #[serde(default)]
  pub message:        Option<Message>,
  #[serde(default)]
  pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
  pub message_id: i64,
  pub chat:       Chat,
  #[serde(default)]
  pub from:       Option<Sender>,
  #[serde(default)]
  pub text:       Option<String>,
}

impl Message {
  pub fn reference(&self) -> MessageRef {
    MessageRef { chat_id: ChatId(self.chat.id), message_id: self.message_id }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
  pub id: i64,
}

/// The Telegram account behind a message or button press.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sender {
  pub id:         i64,
  #[serde(default)]
  pub first_name: String,
  #[serde(default)]
  pub username:   Option<String>,
}

impl Sender {
  pub fn display_name(&self) -> &str {
    self.username.as_deref().unwrap_or(&self.first_name)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackQuery {
  pub id:      String,
  pub from:    Sender,
  #[serde(default)]
  pub message: Option<Message>,
  #[serde(default)]
  pub data:    Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<R> {
  ok:          bool,
  result:      Option<R>,
  description: Option<String>,
}

impl<R> ApiResponse<R> {
  fn into_result(self, method: &str) -> Result<R> {
    match (self.ok, self.result) {
      (true, Some(result)) => Ok(result),
      (ok, _) => Err(Error::Telegram {
        method:      method.to_owned(),
        description: self.description.unwrap_or_else(|| {
          if ok { "response without result".to_owned() } else { "unknown error".to_owned() }
        }),
      }),
    }
  }
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct TelegramClient {
  client:       reqwest::Client,
  base:         String,
  parse_mode:   Option<String>,
  send_timeout: Duration,
  poll_timeout: Duration,
}

impl TelegramClient {
  pub fn new(token: &str, config: &TelegramConfig) -> Result<Self> {
    if token.trim().is_empty() {
      return Err(Error::Config("Telegram bot token must not be empty".to_owned()));
    }
    let client = reqwest::Client::builder().build()?;
    Ok(Self {
      client,
      base: format!("{}/bot{}", config.api_base.trim_end_matches('/'), token.trim()),
      parse_mode: config.parse_mode.clone(),
      send_timeout: config.send_timeout(),
      poll_timeout: config.poll_timeout(),
    })
  }

  async fn call<R: DeserializeOwned>(
    &self,
    method: &str,
    body: &Value,
    timeout: Duration,
  ) -> Result<R> {
    let resp = self
      .client
      .post(format!("{}/{method}", self.base))
      .json(body)
      .timeout(timeout)
      .send()
      .await
      .map_err(|e| Error::Http(e.without_url()))?;

    let api: ApiResponse<R> = resp.json().await.map_err(|e| Error::Http(e.without_url()))?;
    api.into_result(method)
  }

  /// Long-poll for updates with `update_id >= offset`.
  pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>> {
    let body = json!({
      "offset": offset,
      "timeout": self.poll_timeout.as_secs(),
      "allowed_updates": ["message", "callback_query"],
    });
    self
      .call("getUpdates", &body, self.poll_timeout + self.send_timeout)
      .await
  }

  pub async fn set_webhook(&self, url: &str, secret_token: Option<&str>) -> Result<()> {
    let mut body = json!({
      "url": url,
      "allowed_updates": ["message", "callback_query"],
    });
    if let Some(secret) = secret_token {
      body["secret_token"] = Value::String(secret.to_owned());
    }
    let _: bool = self.call("setWebhook", &body, self.send_timeout).await?;
    tracing::info!(%url, "webhook registered");
    Ok(())
  }

  /// Required before long polling when a webhook was registered earlier.
  pub async fn delete_webhook(&self) -> Result<()> {
    let _: bool = self
      .call("deleteWebhook", &json!({}), self.send_timeout)
      .await?;
    Ok(())
  }

  fn message_body(&self, text: &str, markup: Option<&InlineKeyboard>) -> Value {
    let mut body = json!({ "text": text });
    if let Some(mode) = &self.parse_mode {
      body["parse_mode"] = Value::String(mode.clone());
    }
    if let Some(markup) = markup {
      body["reply_markup"] = markup.to_json();
    }
    body
  }
}

impl Transport for TelegramClient {
  type Error = Error;

  async fn send_message(
    &self,
    chat_id: ChatId,
    text: &str,
    markup: Option<&InlineKeyboard>,
  ) -> Result<MessageRef> {
    let mut body = self.message_body(text, markup);
    body["chat_id"] = json!(chat_id.0);

    let message: Message = self.call("sendMessage", &body, self.send_timeout).await?;
    tracing::debug!(%chat_id, message_id = message.message_id, "message sent");
    Ok(message.reference())
  }

  async fn edit_message(
    &self,
    message: MessageRef,
    text: &str,
    markup: Option<&InlineKeyboard>,
  ) -> Result<()> {
    let mut body = self.message_body(text, markup);
    body["chat_id"] = json!(message.chat_id.0);
    body["message_id"] = json!(message.message_id);

    match self
      .call::<Value>("editMessageText", &body, self.send_timeout)
      .await
    {
      Ok(_) => Ok(()),
      // Re-pressing a button that renders the same screen.
      Err(Error::Telegram { description, .. })
        if description.contains("message is not modified") =>
      {
        Ok(())
      }
      Err(e) => Err(e),
    }
  }

  async fn acknowledge(&self, callback_id: &str) -> Result<()> {
    let body = json!({ "callback_query_id": callback_id });
    let _: bool = self
      .call("answerCallbackQuery", &body, self.send_timeout)
      .await?;
    Ok(())
  }
}
