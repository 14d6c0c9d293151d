//! Webhook intake: Telegram pushes updates to an HTTPS endpoint.

use std::sync::Arc;

use axum::{
  Router,
  body::Bytes,
  extract::State,
  http::{HeaderMap, StatusCode},
  routing::{get, post},
};
use magneto_core::{store::PreferenceStore, transport::Transport};
use tower_http::trace::TraceLayer;

use crate::{App, handlers, source::ForecastSource, telegram::Update};

pub const WEBHOOK_PATH: &str = "/telegram/webhook";

/// Header Telegram echoes the `secret_token` from `setWebhook` in.
pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

struct WebhookState<S, T, F> {
  app:          App<S, T, F>,
  secret_token: Option<Arc<str>>,
}

impl<S, T, F> Clone for WebhookState<S, T, F> {
  fn clone(&self) -> Self {
    Self { app: self.app.clone(), secret_token: self.secret_token.clone() }
  }
}

/// Build the webhook [`Router`]: `POST /telegram/webhook` and `GET /healthz`.
pub fn router<S, T, F>(app: App<S, T, F>, secret_token: Option<String>) -> Router
where
  S: PreferenceStore + 'static,
  T: Transport + 'static,
  F: ForecastSource + 'static,
{
  let state = WebhookState { app, secret_token: secret_token.map(Arc::from) };

  Router::new()
    .route("/healthz",   get(healthz))
    .route(WEBHOOK_PATH, post(receive::<S, T, F>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

async fn healthz() -> &'static str { "ok" }

/// Updates are handled before responding. Handler errors still answer 200 so
/// Telegram does not redeliver an update that can never succeed.
async fn receive<S, T, F>(
  State(state): State<WebhookState<S, T, F>>,
  headers: HeaderMap,
  body: Bytes,
) -> StatusCode
where
  S: PreferenceStore + 'static,
  T: Transport + 'static,
  F: ForecastSource + 'static,
{
  if let Some(expected) = &state.secret_token {
    let given = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
    if given != Some(expected.as_ref()) {
      tracing::warn!("webhook call with missing or wrong secret token");
      return StatusCode::UNAUTHORIZED;
    }
  }

  let update: Update = match serde_json::from_slice(&body) {
    Ok(update) => update,
    Err(e) => {
      tracing::warn!(error = %e, "undecodable webhook payload");
      return StatusCode::BAD_REQUEST;
    }
  };

  let update_id = update.update_id;
  if let Err(e) = handlers::handle_update(&state.app, update).await {
    tracing::warn!(update_id, error = %e, "update handling failed");
  }
  StatusCode::OK
}

#[cfg(test)]
mod tests {
  use axum::{body::Body, http::Request};
  use chrono::Utc;
  use magneto_core::user::ChatId;
  use serde_json::json;
  use tower::ServiceExt as _;

  use super::*;
  use crate::testing::{TestApp, app};

  fn start_body(chat: i64) -> String {
    json!({
      "update_id": 1,
      "message": {
        "message_id": 1,
        "chat": { "id": chat },
        "from": { "id": chat, "first_name": "Alice" },
        "text": "/start"
      }
    })
    .to_string()
  }

  async fn post_update(
    app: TestApp,
    secret: Option<&str>,
    header: Option<&str>,
    body: String,
  ) -> StatusCode {
    let mut builder = Request::builder()
      .method("POST")
      .uri(WEBHOOK_PATH)
      .header("content-type", "application/json");
    if let Some(value) = header {
      builder = builder.header(SECRET_HEADER, value);
    }
    let req = builder.body(Body::from(body)).unwrap();
    router(app, secret.map(str::to_owned))
      .oneshot(req)
      .await
      .unwrap()
      .status()
  }

  #[tokio::test]
  async fn healthz_is_ok() {
    let app = app(Utc::now().date_naive()).await;
    let req = Request::builder().uri("/healthz").body(Body::empty()).unwrap();
    let resp = router(app, None).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn update_is_handled() {
    let app = app(Utc::now().date_naive()).await;
    let status = post_update(app.clone(), Some("s3cret"), Some("s3cret"), start_body(42)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(app.store.get_user(ChatId(42)).await.unwrap().is_some());
    assert_eq!(app.transport.sent().len(), 1);
  }

  #[tokio::test]
  async fn wrong_or_missing_secret_is_rejected() {
    let app = app(Utc::now().date_naive()).await;

    for header in [None, Some("guess")] {
      let status = post_update(app.clone(), Some("s3cret"), header, start_body(42)).await;
      assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    assert!(app.store.get_user(ChatId(42)).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn malformed_payload_is_bad_request() {
    let app = app(Utc::now().date_naive()).await;
    let status = post_update(app, None, None, "{not json".to_owned()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn handler_errors_still_acknowledge() {
    let app = app(Utc::now().date_naive()).await;
    let body = json!({
      "update_id": 2,
      "callback_query": {
        "id": "cb",
        "from": { "id": 42, "first_name": "Alice" },
        "message": { "message_id": 5, "chat": { "id": 42 } },
        "data": "toggle:volume"
      }
    })
    .to_string();

    assert_eq!(post_update(app, None, None, body).await, StatusCode::OK);
  }
}
