///
/// This module implements the CLI interface for bulsat-epg: command parsing,
/// main entrypoints and user-visible output.
///
/// All core business logic (session handshake, catalog, guide, rendering and
/// the pipeline) lives in the [`bulsat-epg-core`] crate. This module only
/// loads configuration, wires the concrete client and state file into the
/// pipeline, and prints results.
///
/// ## How To Use
/// - For command-line users: use the installed `bulsat-epg` binary with `--help`.
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// [`bulsat-epg-core`]: ../../bulsat-epg-core/
use crate::load_config::load_config;
use anyhow::{Context, Result};
use bulsat_epg_core::client::BulsatClient;
use bulsat_epg_core::contract::TracingProgress;
use bulsat_epg_core::pipeline::run_pipeline;
use bulsat_epg_core::state::StateFile;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// CLI for bulsat-epg: refresh the Bulsatcom playlist and guide.
#[derive(Parser)]
#[clap(
    name = "bulsat-epg",
    version,
    about = "Log in to Bulsatcom IPTV and write an M3U playlist plus an XMLTV guide"
)]
pub struct Cli {
    /// Enable debug-level logging (also enabled by `debug: true` in the config)
    #[clap(long, global = true)]
    pub debug: bool,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the pipeline once: login, fetch channels and guide, write both files
    Run {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
    /// Print the state recorded by the last run
    Status {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
    /// Print the refresh interval in hours, clamped to the configured bounds
    Interval {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
}

impl Commands {
    pub fn config_path(&self) -> &Path {
        match self {
            Commands::Run { config } | Commands::Status { config } | Commands::Interval { config } => {
                config
            }
        }
    }
}

/// True when `--debug` was given or the config file asks for debug logging.
/// An unreadable config counts as "no"; `run` reports the real error later.
pub fn wants_debug(cli: &Cli) -> bool {
    cli.debug
        || load_config(cli.command.config_path())
            .map(|c| c.debug)
            .unwrap_or(false)
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli, cancel: CancellationToken) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Run { config } => {
            let config = load_config(config)?;
            let pipeline = config.pipeline_config();
            pipeline.trace_loaded();
            tracing::info!(command = "run", "Starting pipeline run");

            let client = BulsatClient::new(&pipeline.client).context("Failed to build HTTP client")?;
            let store = StateFile::new(config.state_path());
            let outcome = run_pipeline(&pipeline, &client, &store, &TracingProgress, &cancel)
                .await
                .context("Pipeline run failed")?;

            tracing::info!(command = "run", channels = outcome.channel_count, "Run complete");
            println!(
                "Wrote {} channels to {} and {}",
                outcome.channel_count,
                pipeline.output.playlist.display(),
                pipeline.output.guide.display()
            );
            Ok(())
        }
        Commands::Status { config } => {
            let config = load_config(config)?;
            let store = StateFile::new(config.state_path());
            let state = store
                .load()
                .with_context(|| format!("Failed to read run state {}", store.path().display()))?;
            tracing::info!(command = "status", path = %store.path().display(), "Run state loaded");
            println!("{}", serde_json::to_string_pretty(&state)?);
            Ok(())
        }
        Commands::Interval { config } => {
            let config = load_config(config)?;
            let hours = config.refresh_interval_hours();
            tracing::info!(command = "interval", hours, "Refresh interval resolved");
            println!("{hours}");
            Ok(())
        }
    }
}
