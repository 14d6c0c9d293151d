//! Long-polling intake loop.

use std::{future::Future, time::Duration};

use magneto_core::{store::PreferenceStore, transport::Transport};
use tokio::task::JoinSet;

use crate::{
  App, Result, handlers,
  source::ForecastSource,
  telegram::{TelegramClient, Update},
};

const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Anything that hands out batches of updates starting at an offset.
pub trait UpdateFeed: Send + Sync {
  fn next_batch(&self, offset: Option<i64>) -> impl Future<Output = Result<Vec<Update>>> + Send + '_;
}

impl UpdateFeed for TelegramClient {
  fn next_batch(&self, offset: Option<i64>) -> impl Future<Output = Result<Vec<Update>>> + Send + '_ {
    self.get_updates(offset)
  }
}

/// Poll `feed` until `shutdown` resolves.
///
/// The updates of one batch are handled concurrently and all of them finish
/// before the next poll, which also acknowledges the batch to Telegram.
pub async fn run<S, T, F, U>(app: App<S, T, F>, feed: &U, shutdown: impl Future<Output = ()>)
where
  S: PreferenceStore + 'static,
  T: Transport + 'static,
  F: ForecastSource + 'static,
  U: UpdateFeed,
{
  tokio::pin!(shutdown);
  let mut offset: Option<i64> = None;
  tracing::info!("long polling for updates");

  loop {
    let batch = tokio::select! {
      () = &mut shutdown => break,
      batch = feed.next_batch(offset) => batch,
    };

    let updates = match batch {
      Ok(updates) => updates,
      Err(e) => {
        tracing::warn!(error = %e, "polling failed; backing off");
        tokio::select! {
          () = &mut shutdown => break,
          () = tokio::time::sleep(ERROR_BACKOFF) => continue,
        }
      }
    };

    let mut tasks = JoinSet::new();
    for update in updates {
      let next = update.update_id + 1;
      offset = Some(offset.map_or(next, |o| o.max(next)));
      let app = app.clone();
      tasks.spawn(async move {
        let update_id = update.update_id;
        if let Err(e) = handlers::handle_update(&app, update).await {
          tracing::warn!(update_id, error = %e, "update handling failed");
        }
      });
    }
    while let Some(joined) = tasks.join_next().await {
      if let Err(e) = joined {
        tracing::error!(error = %e, "update task panicked");
      }
    }
  }

  tracing::info!("polling stopped");
}

#[cfg(test)]
mod tests {
  use std::{collections::VecDeque, sync::Mutex};

  use chrono::Utc;
  use magneto_core::user::ChatId;
  use serde_json::json;
  use tokio::sync::Notify;

  use super::*;
  use crate::testing::app;

  /// Serves queued batches, then signals `drained` and stays silent.
  struct ScriptedFeed {
    batches: Mutex<VecDeque<Vec<Update>>>,
    offsets: Mutex<Vec<Option<i64>>>,
    drained: Notify,
  }

  impl UpdateFeed for ScriptedFeed {
    async fn next_batch(&self, offset: Option<i64>) -> Result<Vec<Update>> {
      self.offsets.lock().unwrap().push(offset);
      let next = self.batches.lock().unwrap().pop_front();
      match next {
        Some(batch) => Ok(batch),
        None => {
          self.drained.notify_one();
          std::future::pending().await
        }
      }
    }
  }

  fn start(update_id: i64, chat: i64) -> Update {
    serde_json::from_value(json!({
      "update_id": update_id,
      "message": {
        "message_id": update_id,
        "chat": { "id": chat },
        "from": { "id": chat, "first_name": "user" },
        "text": "/start"
      }
    }))
    .unwrap()
  }

  #[tokio::test]
  async fn handles_batches_and_advances_offset() {
    let app = app(Utc::now().date_naive()).await;
    let feed = ScriptedFeed {
      batches: Mutex::new(VecDeque::from([vec![start(10, 1), start(11, 2)], vec![start(12, 3)]])),
      offsets: Mutex::new(Vec::new()),
      drained: Notify::new(),
    };

    run(app.clone(), &feed, feed.drained.notified()).await;

    assert_eq!(*feed.offsets.lock().unwrap(), vec![None, Some(12), Some(13)]);
    for chat in 1..=3 {
      assert!(app.store.get_user(ChatId(chat)).await.unwrap().is_some());
    }
    assert_eq!(app.transport.sent().len(), 3);
  }
}
