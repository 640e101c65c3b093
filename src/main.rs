mod app;
mod constants;
mod daemon;
mod handlers;
mod state;
mod subscriptions;
mod views;

use anyhow::{Context, Result};
use cadenza_notifications_config::NotificationsConfig;
use clap::Parser;
use state::center::MonitorId;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Notification daemon and center state for the cadenza shell.
#[derive(Parser, Debug)]
#[command(name = "cadenza-notifications", version, about)]
struct Args {
    /// Send a request to the running instance and print its reply,
    /// e.g. `noti-act`, `toggle-center eDP-1` or `status`.
    request: Vec<String>,

    /// Config file path override.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Monitor that carries a notification tile. May be repeated.
    #[arg(long = "monitor")]
    monitors: Vec<String>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

    #[cfg(feature = "systemd")]
    let journald = match tracing_journald::layer() {
        Ok(layer) => Some(layer),
        Err(err) => {
            eprintln!("journald unavailable, logging to stderr only: {err}");
            None
        }
    };
    #[cfg(not(feature = "systemd"))]
    let journald: Option<tracing_subscriber::layer::Identity> = None;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(journald)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_backtrace::install();
    init_logging();

    let args = Args::parse();

    if !args.request.is_empty() {
        let request = args.request.join(" ");
        let reply = subscriptions::control::request(&subscriptions::control::socket_path(), &request)
            .await?;
        println!("{reply}");
        return Ok(());
    }

    let config = match args.config {
        Some(path) => NotificationsConfig::load_from(&path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => NotificationsConfig::load(),
    };
    tracing::debug!("config: {config:?}");

    let monitors = args.monitors.into_iter().map(MonitorId).collect();
    app::run(config, monitors).await
}
