//! `h2space` -- operator console for H2Space content.
//!
//! Lists, edits, publishes and versions content against the content
//! service. Log output goes to stderr so `--json` output stays clean.
//!
//! # Environment variables
//!
//! | Variable                 | Default                     | Description                      |
//! |--------------------------|-----------------------------|----------------------------------|
//! | `API_BASE_URL`           | `http://localhost:3001/api` | Content service base URL         |
//! | `AUTH_TOKEN`             | --                          | Bearer token for the service     |
//! | `API_TIMEOUT_SECS`       | `30`                        | Per-request timeout              |
//! | `AUTOSAVE_INTERVAL_SECS` | `60`                        | Autosave period while editing    |
//! | `MAX_TAGS`               | `10`                        | Tag limit per content item       |
//! | `MEDIA_MAX_SIZE_MB`      | `5`                         | Upload size limit                |
//! | `LOG_FORMAT`             | `text`                      | `json` for structured logs       |
//! | `RUST_LOG`               | `h2space=info,...`          | Tracing filter                   |

mod args;
mod commands;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use h2space_client::{ClientConfig, ContentApi, SessionContext};
use h2space_editor::EditorConfig;
use h2space_events::{run_notice_collector, EventBus, NoticeBoard};
use tokio::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::args::Cli;
use crate::commands::Context;

/// How long to wait for in-flight events to reach the notice board on exit.
const NOTICE_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let client_config = ClientConfig::from_env();
    let config = EditorConfig::from_env();
    tracing::debug!(
        base_url = %client_config.base_url,
        autosave_secs = config.autosave.interval.as_secs(),
        "Configuration loaded",
    );

    let api = ContentApi::new(&client_config, SessionContext::new())?;
    if !api.session().is_authenticated() {
        tracing::debug!("No API token configured, requests are anonymous");
    }

    let bus = Arc::new(EventBus::default());
    let board = Arc::new(Mutex::new(NoticeBoard::new()));
    let collector = tokio::spawn(run_notice_collector(board.clone(), bus.subscribe()));

    let ctx = Context {
        repo: Arc::new(api),
        bus,
        config,
        json: cli.json,
    };
    let result = commands::run(cli.command, &ctx).await;

    // The collector stops once the last bus handle is gone.
    drop(ctx);
    if tokio::time::timeout(NOTICE_DRAIN_TIMEOUT, collector)
        .await
        .is_err()
    {
        tracing::debug!("Notice collector still running at exit");
    }
    for notice in board.lock().await.active() {
        eprintln!("! {}", notice.message);
    }

    result
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "h2space=info,h2space_editor=info,h2space_client=info".into());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}
