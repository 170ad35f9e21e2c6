//! Vigil - notification console for the mortuary management system.
//!
//! A headless console client for the notification core: it holds the single
//! push connection, feeds incoming events into the alert store and the
//! durable notification feed, and renders the resulting view-model as a
//! status line. The full administrative UI (registration forms, inventory,
//! analytics) lives elsewhere and consumes the same crates.
//!
//! ## Usage
//!
//! ```bash
//! # Connect with the default configuration (~/.vigil/config.yaml)
//! vigil
//!
//! # With verbose logging and explicit endpoints
//! vigil -v --push-url ws://host:5000/notifications/stream --api-url http://host:5000/api
//! ```
//!
//! Interactive commands (each keypress also arms the tone cue):
//! `d` dismiss all alerts, `r` mark all notifications read, `m` toggle
//! minimized, `f` refresh the notification list, `q` quit.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use vigil_alerts::{AlertStore, DashboardView, ToneEmitter};
use vigil_core::{VigilConfig, VigilError, init_logging};
use vigil_feed::{NotificationApi, NotificationFeed, PushClient};

/// Vigil notification console
///
/// Maintains the live push connection to the notification service and the
/// durable notification list, and prints alert state as it changes.
#[derive(Parser, Debug)]
#[command(name = "vigil")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging (increases log level)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Directory for log files (defaults to ~/.vigil/logs/)
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Configuration file (defaults to ~/.vigil/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the push channel endpoint
    #[arg(long)]
    push_url: Option<String>,

    /// Override the notification API base URL
    #[arg(long)]
    api_url: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _guard = match init_logging(cli.log_dir.clone(), cli.verbose > 0) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            return ExitCode::from(1);
        }
    };

    info!("starting vigil console");

    match run(cli).await {
        Ok(()) => {
            info!("vigil console exited normally");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("vigil console error: {e}");
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = VigilConfig::load(cli.config).map_err(with_guidance)?;
    if let Some(url) = cli.push_url {
        config.push.url = url;
    }
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }
    config.validate().map_err(with_guidance)?;

    // Explicitly constructed, owned instances; lifecycle tied to this scope.
    let tone = ToneEmitter::bell(config.sound.enabled);
    let store = AlertStore::new(&config.alerts, tone.clone());
    let feed = NotificationFeed::new(NotificationApi::from_config(&config.api)?);
    let (push, mut events, mut status) = PushClient::new(&config.push);

    let resync = feed.spawn_resync(push.subscribe_status());
    push.connect();

    // Initial mount fetch; a failure is retryable via the `f` command.
    if let Err(e) = feed.fetch_all().await {
        warn!(error = %e, "initial notification fetch failed");
        eprintln!("Could not load notifications ({e}); press 'f' to retry.");
    }

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    render(&store, &feed, &push);

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                feed.ingest_push(&event.frame);
                store.ingest(event.frame, event.default_severity);
                render(&store, &feed, &push);
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                render(&store, &feed, &push);
            }
            line = input.next_line() => {
                let Ok(Some(line)) = line else { break };
                // Any input counts as the arming gesture.
                tone.arm();
                match line.trim() {
                    "q" => break,
                    "d" => store.dismiss_all(),
                    "r" => feed.mark_all_read(),
                    "m" => {
                        store.toggle_minimized();
                    }
                    "f" => {
                        if let Err(e) = feed.fetch_all().await {
                            warn!(error = %e, "manual refresh failed");
                            eprintln!("Refresh failed ({e}); press 'f' to retry.");
                        }
                    }
                    "" => {}
                    other => println!("unknown command {other:?} (d/r/m/f/q)"),
                }
                render(&store, &feed, &push);
            }
        }
    }

    push.shutdown();
    resync.abort();
    Ok(())
}

/// Attach the error's actionable hint, when it has one, to the message the
/// user sees on exit.
fn with_guidance(e: VigilError) -> anyhow::Error {
    match e.guidance() {
        Some(hint) => anyhow::anyhow!("{e}\n  hint: {hint}"),
        None => e.into(),
    }
}

fn render(store: &AlertStore, feed: &NotificationFeed, push: &PushClient) {
    let view = DashboardView::build(&store.snapshot(), feed.unread_count(), push.status());
    println!("{}", view.format_status_line());
}
