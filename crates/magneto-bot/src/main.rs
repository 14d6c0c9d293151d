//! magneto service binary.
//!
//! Reads `config.toml` (or the path given with `--config`) plus `MAGNETO_*`
//! environment variables, opens the SQLite store and runs the Telegram bot
//! together with its daily broadcast schedule.
//!
//! ```text
//! magneto                          # run the bot (long polling or webhook)
//! magneto forecast --days-ahead 1  # print tomorrow's report
//! magneto dispatch notifications   # run one broadcast now
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use magneto_bot::{
  App, BotConfig, dispatch, forecast, polling,
  source::HttpForecastSource,
  telegram::TelegramClient,
  webhook,
};
use magneto_feed::{RenderMode, Rendered, format_kp};
use magneto_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Geomagnetic storm alerts over Telegram")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Run the bot and its broadcast schedule (default).
  Run,
  /// Fetch the feed and print one day's report.
  Forecast {
    /// 0 for today, 1 for tomorrow, ...
    #[arg(long, default_value_t = 0)]
    days_ahead: u32,
    /// Print only the day's maximum index value.
    #[arg(long)]
    max_only:   bool,
  },
  /// Run one broadcast immediately and exit.
  Dispatch {
    #[arg(value_enum)]
    job: Job,
  },
}

#[derive(Clone, Copy, ValueEnum)]
enum Job {
  Notifications,
  Survey,
}

type BotApp = App<SqliteStore, TelegramClient, HttpForecastSource>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let config = BotConfig::load(cli.config.as_path()).context("failed to load configuration")?;

  match cli.command.unwrap_or(Command::Run) {
    Command::Run => run(config).await,
    Command::Forecast { days_ahead, max_only } => print_forecast(&config, days_ahead, max_only).await,
    Command::Dispatch { job } => dispatch_once(config, job).await,
  }
}

async fn build_app(config: BotConfig) -> anyhow::Result<BotApp> {
  let store_path = expand_tilde(&config.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let client = TelegramClient::new(&config.bot_token, &config.telegram)
    .context("failed to build Telegram client")?;
  let source = HttpForecastSource::new(&config).context("failed to build feed client")?;

  Ok(App::new(store, client, source, config))
}

async fn run(config: BotConfig) -> anyhow::Result<()> {
  let app = build_app(config).await?;

  let jobs = magneto_bot::scheduler::spawn(app.clone()).context("invalid schedule")?;

  let result = match app.config.telegram.webhook.clone() {
    Some(hook) => {
      app
        .transport
        .set_webhook(&hook.public_url, hook.secret_token.as_deref())
        .await
        .context("failed to register webhook")?;

      let address = format!("{}:{}", hook.host, hook.port);
      tracing::info!("Listening on http://{address}");
      let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

      axum::serve(listener, webhook::router(app.clone(), hook.secret_token))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
    }
    None => {
      app
        .transport
        .delete_webhook()
        .await
        .context("failed to clear webhook")?;
      let client = app.transport.clone();
      polling::run(app, client.as_ref(), shutdown_signal()).await;
      Ok(())
    }
  };

  for job in jobs {
    job.abort();
  }
  result
}

async fn print_forecast(config: &BotConfig, days_ahead: u32, max_only: bool) -> anyhow::Result<()> {
  let source = HttpForecastSource::new(config).context("failed to build feed client")?;
  let today = Utc::now().date_naive();

  if !max_only {
    println!("{}", forecast::forecast_text(&source, today, days_ahead).await);
    return Ok(());
  }

  let day = forecast::fetch_day(&source, today, days_ahead)
    .await
    .map_err(|e| anyhow::anyhow!(e.user_message()))?;
  match magneto_feed::render(&day.observations, day.date, RenderMode::MaxOnly)? {
    Rendered::Max(kp) => println!("{}", format_kp(kp)),
    Rendered::Report(text) => println!("{text}"),
  }
  Ok(())
}

async fn dispatch_once(config: BotConfig, job: Job) -> anyhow::Result<()> {
  let app = build_app(config).await?;
  let report = match job {
    Job::Notifications => dispatch::notifications(&app).await,
    Job::Survey => dispatch::survey(&app).await,
  }
  .context("broadcast failed")?;

  println!(
    "attempted {}, delivered {}, failed {}, skipped {}",
    report.attempted,
    report.delivered,
    report.failed.len(),
    report.skipped,
  );
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(error = %e, "failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  tracing::info!("shutting down");
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
