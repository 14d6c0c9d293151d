//! Where raw forecast payloads come from.

use std::future::Future;

use magneto_feed::Error as FeedError;
use serde_json::Value;

use crate::{BotConfig, Error, Result};

/// Produces the raw feed payload: a JSON array of rows, header first.
pub trait ForecastSource: Send + Sync {
  fn fetch(&self) -> impl Future<Output = magneto_feed::Result<Value>> + Send + '_;
}

/// Fetches the planetary Kp forecast over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpForecastSource {
  client: reqwest::Client,
  url:    String,
}

impl HttpForecastSource {
  pub fn new(config: &BotConfig) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(config.feed_timeout())
      .build()
      .map_err(Error::Http)?;
    Ok(Self { client, url: config.feed_url.clone() })
  }
}

impl ForecastSource for HttpForecastSource {
  async fn fetch(&self) -> magneto_feed::Result<Value> {
    tracing::debug!(url = %self.url, "fetching forecast feed");

    let resp = self
      .client
      .get(&self.url)
      .send()
      .await
      .and_then(reqwest::Response::error_for_status)
      .map_err(|e| FeedError::FeedUnavailable(e.to_string()))?;

    resp
      .json::<Value>()
      .await
      .map_err(|e| FeedError::MalformedPayload(e.to_string()))
  }
}
