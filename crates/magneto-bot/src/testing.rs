//! In-process fakes shared by the unit tests of this crate.

use std::{
  collections::HashSet,
  sync::{
    Mutex,
    atomic::{AtomicI64, Ordering},
  },
};

use chrono::NaiveDate;
use magneto_core::{
  keyboard::InlineKeyboard,
  transport::{MessageRef, Transport},
  user::ChatId,
};
use magneto_store_sqlite::SqliteStore;
use serde_json::{Value, json};

use crate::{App, BotConfig, source::ForecastSource};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// A feed payload with five rows for `today` (peak 6) and two for the day
/// after (peak 5.33).
pub fn payload(today: NaiveDate) -> Value {
  let tomorrow = today.succ_opt().expect("not the last day");
  let at = |day: NaiveDate, hour: u32| format!("{} {hour:02}:00:00", day.format("%Y-%m-%d"));
  json!([
    ["time_tag", "kp", "observed", "noaa_scale"],
    [at(today, 0), "2.00", "observed", null],
    [at(today, 3), "3.00", "observed", null],
    [at(today, 6), "6.00", "predicted", "G2"],
    [at(today, 9), "6.00", "predicted", "G2"],
    [at(today, 12), "3.00", "predicted", null],
    [at(tomorrow, 0), "4.00", "predicted", null],
    [at(tomorrow, 3), "5.33", "predicted", "G1"],
  ])
}

// ─── Forecast source ─────────────────────────────────────────────────────────

pub struct FixtureSource {
  payload: Option<Value>,
}

impl FixtureSource {
  pub fn ok(payload: Value) -> Self { Self { payload: Some(payload) } }

  pub fn unavailable() -> Self { Self { payload: None } }
}

impl ForecastSource for FixtureSource {
  async fn fetch(&self) -> magneto_feed::Result<Value> {
    self
      .payload
      .clone()
      .ok_or_else(|| magneto_feed::Error::FeedUnavailable("connection refused".into()))
  }
}

// ─── Transport ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("simulated send failure for {0}")]
pub struct SimulatedFailure(pub ChatId);

#[derive(Debug, Clone)]
pub struct Outgoing {
  pub chat_id: ChatId,
  pub text:    String,
  pub markup:  Option<InlineKeyboard>,
}

/// Records everything sent; refuses to deliver to chats in `failing` and
/// never answers sends to chats in `hanging`.
#[derive(Default)]
pub struct RecordingTransport {
  pub sent:         Mutex<Vec<Outgoing>>,
  pub edited:       Mutex<Vec<(MessageRef, Outgoing)>>,
  pub acknowledged: Mutex<Vec<String>>,
  failing:          HashSet<ChatId>,
  hanging:          HashSet<ChatId>,
  next_id:          AtomicI64,
}

impl RecordingTransport {
  pub fn failing_for(ids: impl IntoIterator<Item = ChatId>) -> Self {
    Self { failing: ids.into_iter().collect(), ..Self::default() }
  }

  pub fn hanging_for(ids: impl IntoIterator<Item = ChatId>) -> Self {
    Self { hanging: ids.into_iter().collect(), ..Self::default() }
  }

  pub fn sent(&self) -> Vec<Outgoing> { self.sent.lock().unwrap().clone() }

  pub fn edited(&self) -> Vec<Outgoing> {
    self.edited.lock().unwrap().iter().map(|(_, o)| o.clone()).collect()
  }

  pub fn last_edit(&self) -> Outgoing { self.edited().pop().expect("a message was edited") }
}

impl Transport for RecordingTransport {
  type Error = SimulatedFailure;

  async fn send_message(
    &self,
    chat_id: ChatId,
    text: &str,
    markup: Option<&InlineKeyboard>,
  ) -> Result<MessageRef, SimulatedFailure> {
    if self.failing.contains(&chat_id) {
      return Err(SimulatedFailure(chat_id));
    }
    if self.hanging.contains(&chat_id) {
      std::future::pending::<()>().await;
    }
    self.sent.lock().unwrap().push(Outgoing {
      chat_id,
      text: text.to_owned(),
      markup: markup.cloned(),
    });
    let message_id = self.next_id.fetch_add(1, Ordering::Relaxed);
    Ok(MessageRef { chat_id, message_id })
  }

  async fn edit_message(
    &self,
    message: MessageRef,
    text: &str,
    markup: Option<&InlineKeyboard>,
  ) -> Result<(), SimulatedFailure> {
    self.edited.lock().unwrap().push((message, Outgoing {
      chat_id: message.chat_id,
      text:    text.to_owned(),
      markup:  markup.cloned(),
    }));
    Ok(())
  }

  async fn acknowledge(&self, callback_id: &str) -> Result<(), SimulatedFailure> {
    self.acknowledged.lock().unwrap().push(callback_id.to_owned());
    Ok(())
  }
}

// ─── App ─────────────────────────────────────────────────────────────────────

pub type TestApp = App<SqliteStore, RecordingTransport, FixtureSource>;

pub async fn app_with(transport: RecordingTransport, source: FixtureSource) -> TestApp {
  let store = SqliteStore::open_in_memory().await.expect("in-memory store");
  App::new(store, transport, source, BotConfig::new("test-token"))
}

pub async fn app(today: NaiveDate) -> TestApp {
  app_with(RecordingTransport::default(), FixtureSource::ok(payload(today))).await
}
