use std::path::PathBuf;

use tracing::{debug, info};

use crate::client::ClientSettings;
use crate::contract::Credential;
use crate::retry::RetryPolicy;

/// Everything one pipeline run needs, already validated and typed.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub credential: Credential,
    pub client: ClientSettings,
    pub download_epg: bool,
    /// Comma separated genres excluded from both documents
    pub blocked_genres: String,
    pub retry: RetryPolicy,
    pub output: OutputPaths,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub playlist: PathBuf,
    pub guide: PathBuf,
}

impl PipelineConfig {
    pub fn trace_loaded(&self) {
        info!(
            user = %self.credential.username,
            profile = ?self.credential.profile,
            api_url = %self.client.api_url,
            download_epg = self.download_epg,
            max_attempts = self.retry.max_attempts,
            playlist = %self.output.playlist.display(),
            guide = %self.output.guide.display(),
            "Loaded pipeline config"
        );
        debug!(?self, "Pipeline config loaded (full debug)");
    }
}
