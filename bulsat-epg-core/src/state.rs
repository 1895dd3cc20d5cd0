//! Persisted run state: the outbound fields of the external configuration store.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::contract::{OutcomeStore, RunOutcome};
use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    #[serde(default)]
    pub last_error: String,
    #[serde(default)]
    pub last_successful_update: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_channels: usize,
}

impl RunState {
    /// Folds an outcome into the state. A failure only replaces `last_error`;
    /// the figures of the last good run stay visible.
    pub fn apply(mut self, outcome: &RunOutcome) -> Self {
        if outcome.success {
            RunState {
                last_error: String::new(),
                last_successful_update: Some(outcome.completed_at),
                total_channels: outcome.channel_count,
            }
        } else {
            self.last_error = outcome.last_error.clone();
            self
        }
    }
}

/// JSON file backed [`OutcomeStore`].
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored state; a missing file is an empty state.
    pub fn load(&self) -> Result<RunState> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(RunState::default()),
            Err(e) => Err(e.into()),
        }
    }
}

impl OutcomeStore for StateFile {
    fn record(&self, outcome: &RunOutcome) -> Result<()> {
        let state = self.load().unwrap_or_else(|e| {
            debug!(error = %e, path = %self.path.display(), "Ignoring unreadable run state");
            RunState::default()
        });
        let state = state.apply(outcome);
        let json = serde_json::to_string_pretty(&state)?;
        write_atomically(&self.path, json.as_bytes())?;
        info!(
            path = %self.path.display(),
            success = outcome.success,
            total_channels = state.total_channels,
            "Recorded run outcome"
        );
        Ok(())
    }
}

/// Contents written to a temp file next to `target`, not yet visible there.
/// Dropping it without [`StagedWrite::commit`] removes the temp file.
#[derive(Debug)]
pub struct StagedWrite {
    tmp: tempfile::NamedTempFile,
    target: PathBuf,
}

impl StagedWrite {
    pub fn new(target: &Path, contents: &[u8]) -> Result<Self> {
        let dir = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(contents)?;
        tmp.flush()?;
        Ok(Self {
            tmp,
            target: target.to_path_buf(),
        })
    }

    /// Renames the temp file over the target.
    pub fn commit(self) -> Result<()> {
        self.tmp.persist(&self.target).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Writes through a temp file in the target directory and renames it over
/// `path`, so readers see either the old or the new content.
pub fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    StagedWrite::new(path, contents)?.commit()
}
