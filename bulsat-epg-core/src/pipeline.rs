//! High-level pipeline: login → catalog → guide → render → write, for one run.
//!
//! This module sequences a full refresh of the playlist/guide pair:
//!   - Validates that credentials are present
//!   - Acquires an authenticated session, retrying transient failures ([`crate::retry`])
//!   - Fetches the channel catalog
//!   - Enriches channels with guide data when enabled (cancellable, partial results kept)
//!   - Renders both documents from the same filtered channel set
//!   - Writes both files atomically and records the run outcome
//!
//! # Progress
//! Milestones 10/30/50/70/85/100 are reported at stage boundaries, in that order.
//!
//! # Error Handling
//! Any stage failure is recorded in the [`OutcomeStore`] (`success = false`,
//! `last_error` = message) and then returned to the caller. Both documents
//! are rendered and staged in temp files before either target is replaced by
//! rename, so a failed run never leaves a truncated file or a new playlist
//! next to an old guide, and never removes the previous run's output.
//!
//! # Cancellation
//! The token aborts login (backoff sleeps included) and the catalog step with
//! [`Error::Cancelled`]. During guide enrichment it only truncates the guide
//! and the run still completes.
//!
//! # Concurrency
//! One run at a time per output location; the caller serialises runs.

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::PipelineConfig;
use crate::contract::{Backend, OutcomeStore, ProgressSink, RunOutcome};
use crate::error::{Error, Result};
use crate::guide;
use crate::render::{blocked_genres, render_guide, render_playlist};
use crate::retry::with_retry;
use crate::state::StagedWrite;

pub mod milestone {
    pub const VALIDATED: u8 = 10;
    pub const SESSION: u8 = 30;
    pub const CATALOG: u8 = 50;
    pub const GUIDE: u8 = 70;
    pub const PLAYLIST_WRITTEN: u8 = 85;
    pub const DONE: u8 = 100;
}

/// Entrypoint: run the pipeline once and record the outcome.
pub async fn run_pipeline<B, S, P>(
    config: &PipelineConfig,
    backend: &B,
    store: &S,
    progress: &P,
    cancel: &CancellationToken,
) -> Result<RunOutcome>
where
    B: Backend + ?Sized,
    S: OutcomeStore + ?Sized,
    P: ProgressSink + ?Sized,
{
    info!("[PIPELINE] Starting run");

    match execute(config, backend, progress, cancel).await {
        Ok(channel_count) => {
            let outcome = RunOutcome::succeeded(channel_count);
            store.record(&outcome)?;
            progress.report(milestone::DONE);
            info!(channels = channel_count, "[PIPELINE] Run completed successfully");
            Ok(outcome)
        }
        Err(e) => {
            error!(error = %e, "[PIPELINE][ERROR] Run failed");
            let outcome = RunOutcome::failed(&e);
            if let Err(store_err) = store.record(&outcome) {
                error!(error = %store_err, "[PIPELINE][ERROR] Failed to record run outcome");
            }
            Err(e)
        }
    }
}

async fn execute<B, P>(
    config: &PipelineConfig,
    backend: &B,
    progress: &P,
    cancel: &CancellationToken,
) -> Result<usize>
where
    B: Backend + ?Sized,
    P: ProgressSink + ?Sized,
{
    // --- Step 1: Validate ---
    if !config.credential.is_complete() {
        return Err(Error::MissingCredentials);
    }
    progress.report(milestone::VALIDATED);

    // --- Step 2: Session ---
    let credential = &config.credential;
    let session = with_retry(&config.retry, cancel, || backend.open_session(credential)).await?;
    debug!(session = ?session, "[PIPELINE] Session established");
    progress.report(milestone::SESSION);

    // --- Step 3: Catalog ---
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    let mut channels = backend.fetch_channels(&session).await?;
    if channels.is_empty() {
        return Err(Error::EmptyCatalog);
    }
    info!(channels = channels.len(), "[PIPELINE] Catalog fetched");
    progress.report(milestone::CATALOG);

    // --- Step 4: Guide ---
    if config.download_epg {
        let report = guide::enrich(backend, &mut channels, &session, cancel).await;
        if report.cancelled {
            warn!(
                attached = report.attached,
                "[PIPELINE] Guide download cancelled, continuing with partial guide"
            );
        }
    } else {
        info!("[PIPELINE] Guide download disabled");
    }
    progress.report(milestone::GUIDE);

    // --- Step 5: Render, then write ---
    let blocked = blocked_genres(&config.blocked_genres);
    let playlist = render_playlist(&channels, &blocked);
    let guide_doc = render_guide(&channels, &blocked);

    // Both temp files must exist before either target is replaced
    let staged_playlist = StagedWrite::new(&config.output.playlist, playlist.as_bytes())?;
    let staged_guide = StagedWrite::new(&config.output.guide, guide_doc.as_bytes())?;

    staged_playlist.commit()?;
    info!(path = %config.output.playlist.display(), bytes = playlist.len(), "[PIPELINE] Playlist written");
    progress.report(milestone::PLAYLIST_WRITTEN);

    staged_guide.commit()?;
    info!(path = %config.output.guide.display(), bytes = guide_doc.len(), "[PIPELINE] Guide written");

    Ok(channels.len())
}
