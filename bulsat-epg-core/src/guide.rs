//! Per-channel guide lookup and enrichment.
//!
//! Guide data is fetched one channel at a time, in catalog order. The loop
//! checks the cancellation token before every request; a cancelled run keeps
//! whatever was attached so far.

use serde::Deserialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::catalog::opaque_text;
use crate::contract::{Backend, Channel, ProgramEntry, Session};
use crate::error::Result;
use crate::session::HEADER_SESSION;

/// Guide window requested per channel.
pub const GUIDE_WINDOW: &str = "1day";

#[derive(Debug, Deserialize)]
struct RawProgramme {
    #[serde(default)]
    title: Option<String>,
    #[serde(default, deserialize_with = "opaque_text")]
    start: Option<String>,
    #[serde(default, deserialize_with = "opaque_text")]
    stop: Option<String>,
    #[serde(default, alias = "desc")]
    description: Option<String>,
}

impl From<RawProgramme> for ProgramEntry {
    fn from(raw: RawProgramme) -> Self {
        ProgramEntry {
            title: raw.title.unwrap_or_default(),
            start: raw.start.unwrap_or_default(),
            stop: raw.stop.unwrap_or_default(),
            description: raw.description.filter(|d| !d.is_empty()),
        }
    }
}

/// Picks the primary programme for `epg_name` out of a guide response body.
///
/// The body maps epg names to an object carrying `programme`, which is either
/// a single entry or a list whose first element wins.
pub fn decode_programme(body: &Value, epg_name: &str) -> Option<ProgramEntry> {
    let programme = body.get(epg_name)?.get("programme")?;
    let primary = match programme {
        Value::Array(items) => items.first()?,
        other => other,
    };
    match RawProgramme::deserialize(primary) {
        Ok(raw) => Some(raw.into()),
        Err(e) => {
            warn!(epg_name, error = %e, "Skipping undecodable programme entry");
            None
        }
    }
}

/// Fetches the guide window for one channel. Non-success answers yield `None`.
pub async fn fetch_programme(
    http: &reqwest::Client,
    api_url: &str,
    session: &Session,
    epg_name: &str,
) -> Result<Option<ProgramEntry>> {
    let token = session.require_token()?;
    let url = format!("{}/epg/short", api_url.trim_end_matches('/'));
    let response = http
        .post(&url)
        .header(HEADER_SESSION, token)
        .form(&[("epg", GUIDE_WINDOW), ("channel", epg_name)])
        .send()
        .await?;

    if !response.status().is_success() {
        debug!(epg_name, status = %response.status(), "No guide data for channel");
        return Ok(None);
    }
    let body: Value = match response.json().await {
        Ok(body) => body,
        Err(e) => {
            debug!(epg_name, error = %e, "Guide response is not JSON");
            return Ok(None);
        }
    };
    Ok(decode_programme(&body, epg_name))
}

/// What happened during one enrichment pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichReport {
    pub requested: usize,
    pub attached: usize,
    pub cancelled: bool,
}

/// Attaches guide data to `channels` in place, one request at a time.
///
/// Never fails: per-channel errors leave that channel's `program` unset, and
/// cancellation returns early with the channels enriched so far.
pub async fn enrich<B>(
    backend: &B,
    channels: &mut [Channel],
    session: &Session,
    cancel: &CancellationToken,
) -> EnrichReport
where
    B: Backend + ?Sized,
{
    let mut report = EnrichReport::default();
    info!(channels = channels.len(), "Starting guide enrichment");

    for channel in channels.iter_mut() {
        if cancel.is_cancelled() {
            report.cancelled = true;
            info!(
                requested = report.requested,
                attached = report.attached,
                "Guide enrichment cancelled, keeping partial results"
            );
            break;
        }
        if channel.epg_name.is_empty() {
            debug!(title = %channel.title, "Channel has no epg name, skipping guide lookup");
            continue;
        }

        report.requested += 1;
        match backend.fetch_programme(session, &channel.epg_name).await {
            Ok(Some(program)) => {
                channel.program = Some(program);
                report.attached += 1;
            }
            Ok(None) => {
                debug!(epg_name = %channel.epg_name, "No programme returned");
            }
            Err(e) => {
                warn!(epg_name = %channel.epg_name, error = %e, "Guide lookup failed for channel");
            }
        }
    }

    info!(
        requested = report.requested,
        attached = report.attached,
        cancelled = report.cancelled,
        "Guide enrichment finished"
    );
    report
}
