//! The `Transport` trait: outbound chat messaging.
//!
//! Both operations are fire-and-report: a returned error means the attempt
//! failed, a returned `Ok` means the chat service accepted it. Nothing here
//! retries.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{keyboard::InlineKeyboard, user::ChatId};

/// Identifies a message previously accepted by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
  pub chat_id:    ChatId,
  pub message_id: i64,
}

pub trait Transport: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Send a new message, optionally with an inline action menu.
  fn send_message<'a>(
    &'a self,
    chat_id: ChatId,
    text: &'a str,
    markup: Option<&'a InlineKeyboard>,
  ) -> impl Future<Output = Result<MessageRef, Self::Error>> + Send + 'a;

  /// Replace the text and menu of an existing message.
  fn edit_message<'a>(
    &'a self,
    message: MessageRef,
    text: &'a str,
    markup: Option<&'a InlineKeyboard>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Acknowledge a button press so the client stops showing a spinner.
  fn acknowledge<'a>(
    &'a self,
    callback_id: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a {
    let _ = callback_id;
    std::future::ready(Ok(()))
  }
}
