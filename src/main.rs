use anyhow::Result;
use bulsat_epg::cli::{run, wants_debug, Cli};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::Level;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Log level is decided before the subscriber exists, so the config is peeked quietly.
    let level = if wants_debug(&cli) {
        Level::DEBUG
    } else {
        Level::INFO
    };
    // stdout carries command output only
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
    tracing::info!(?level, "CLI application startup: tracing initialised, environment loaded");

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling run");
            on_interrupt.cancel();
        }
    });

    let result = run(cli, cancel).await;
    match &result {
        Ok(_) => tracing::info!("CLI completed successfully"),
        Err(e) => tracing::error!(error = %e, "CLI exited with error"),
    }
    result
}
