//! botwatch - a status dashboard for a small fixed set of monitored bots.
//!
//! Runs as the HTTP server by default; with `BOTWATCH_WATCH_URL` set it
//! runs as a headless watcher polling a remote server instead.

mod config;
mod store;
mod watcher;
mod web;

use config::Config;
use store::StateStore;
use watcher::Watcher;
use web::Server;

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("botwatch=info".parse()?),
        )
        .init();

    let cfg = Config::load();

    if let Some(url) = cfg.watch_url.clone() {
        return run_watch_mode(&url, cfg).await;
    }

    tracing::info!("Starting botwatch on port {}...", cfg.http_port);

    // Seed the default bots up front so the first request sees them.
    let store = Arc::new(StateStore::new());
    let bots = store.list_bots();
    tracing::info!("Monitoring {} bots", bots.len());

    let server = Server::new(cfg, store);
    server.start().await?;

    Ok(())
}

async fn run_watch_mode(
    url: &str,
    cfg: Config,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing::info!("Watching {} every {:?}", url, cfg.poll_interval);

    let watcher = Watcher::new(url, &cfg)?;
    watcher.start();

    tokio::signal::ctrl_c().await?;
    watcher.stop();

    for bot in watcher.bots() {
        tracing::info!("{}: {} (last update {})", bot.name, bot.status, bot.last_update);
    }

    Ok(())
}
