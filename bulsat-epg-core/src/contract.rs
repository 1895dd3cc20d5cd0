//! # contract: data model and trait seams for a pipeline run
//!
//! This module defines the plain data carried through a run (credential,
//! session, channels, programme entries, run outcome) and the three traits
//! the orchestrator depends on:
//!
//! - [`Backend`]: the IPTV backend (login, channel catalog, guide lookup).
//!   Implemented over HTTP by [`crate::client::BulsatClient`].
//! - [`OutcomeStore`]: where the run outcome is persisted for the external
//!   configuration store. Implemented by [`crate::state::StateFile`].
//! - [`ProgressSink`]: receives coarse progress milestones.
//!
//! ## Mocking & Testing
//! - Every trait is annotated for `mockall`, so tests can drive the pipeline
//!   deterministically without a network.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Client identity presented during login. Also selects the auth endpoint path
/// and the platform segment of the channel listing path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DeviceProfile {
    PcWeb,
    #[default]
    SamsungTv,
}

impl DeviceProfile {
    /// The identity string; sent as device id, device name, OS version and OS type alike.
    pub fn identity(&self) -> &'static str {
        match self {
            DeviceProfile::PcWeb => "pcweb",
            DeviceProfile::SamsungTv => "samsungtv",
        }
    }

    pub fn auth_path(&self) -> &'static str {
        match self {
            DeviceProfile::PcWeb => "/auth",
            DeviceProfile::SamsungTv => "/?auth",
        }
    }
}

impl TryFrom<u8> for DeviceProfile {
    type Error = Error;

    fn try_from(selector: u8) -> Result<Self> {
        match selector {
            0 => Ok(DeviceProfile::PcWeb),
            1 => Ok(DeviceProfile::SamsungTv),
            other => Err(Error::Config(format!(
                "device profile must be 0 (pcweb) or 1 (samsungtv), got {other}"
            ))),
        }
    }
}

impl From<DeviceProfile> for u8 {
    fn from(profile: DeviceProfile) -> u8 {
        match profile {
            DeviceProfile::PcWeb => 0,
            DeviceProfile::SamsungTv => 1,
        }
    }
}

/// Account credentials for one run.
#[derive(Clone)]
pub struct Credential {
    pub username: String,
    pub password: String,
    pub profile: DeviceProfile,
}

impl Credential {
    pub fn is_complete(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.trim().is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("profile", &self.profile)
            .finish()
    }
}

/// Session handed out by the backend. Only sessions that finished the
/// handshake may be used for catalog and guide requests.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
    authenticated: bool,
    profile: DeviceProfile,
}

impl Session {
    /// A session whose token was issued but whose credentials were not yet accepted.
    pub(crate) fn pending(token: String, profile: DeviceProfile) -> Self {
        Self {
            token,
            authenticated: false,
            profile,
        }
    }

    pub(crate) fn authenticate(self) -> Self {
        Self {
            authenticated: true,
            ..self
        }
    }

    /// Builds an authenticated session directly. Meant for tests and for
    /// callers that resume a token obtained elsewhere.
    pub fn authenticated(token: impl Into<String>, profile: DeviceProfile) -> Self {
        Self::pending(token.into(), profile).authenticate()
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn profile(&self) -> DeviceProfile {
        self.profile
    }

    /// Returns the token, or [`Error::Unauthenticated`] for a pending session.
    pub fn require_token(&self) -> Result<&str> {
        if self.authenticated {
            Ok(&self.token)
        } else {
            Err(Error::Unauthenticated)
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown: String = self.token.chars().take(6).collect();
        f.debug_struct("Session")
            .field("token", &format_args!("{shown}…"))
            .field("authenticated", &self.authenticated)
            .field("profile", &self.profile)
            .finish()
    }
}

/// One live channel from the catalog. `epg_name` is the key used to look up guide data.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Channel {
    pub id: String,
    pub title: String,
    pub epg_name: String,
    pub sources: Vec<String>,
    pub is_radio: bool,
    pub genre: Option<String>,
    pub program: Option<ProgramEntry>,
}

/// A guide entry. `start` and `stop` are kept exactly as the backend sent them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgramEntry {
    pub title: String,
    pub start: String,
    pub stop: String,
    pub description: Option<String>,
}

/// Result of one pipeline run, handed to the [`OutcomeStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub success: bool,
    pub last_error: String,
    pub channel_count: usize,
    pub completed_at: DateTime<Utc>,
}

impl RunOutcome {
    pub fn succeeded(channel_count: usize) -> Self {
        Self {
            success: true,
            last_error: String::new(),
            channel_count,
            completed_at: Utc::now(),
        }
    }

    pub fn failed(error: &Error) -> Self {
        Self {
            success: false,
            last_error: error.to_string(),
            channel_count: 0,
            completed_at: Utc::now(),
        }
    }
}

/// The IPTV backend as seen by the pipeline.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Backend: Send + Sync {
    /// Runs the login handshake once. Retrying is the caller's business.
    async fn open_session(&self, credential: &Credential) -> Result<Session>;

    /// Fetches the channel catalog. Undecodable entries are skipped, not fatal.
    async fn fetch_channels(&self, session: &Session) -> Result<Vec<Channel>>;

    /// Fetches the primary guide entry for one channel, `None` when the backend has none.
    async fn fetch_programme(&self, session: &Session, epg_name: &str)
        -> Result<Option<ProgramEntry>>;
}

/// Persists the outcome of a run for the external configuration store.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait OutcomeStore: Send + Sync {
    fn record(&self, outcome: &RunOutcome) -> Result<()>;
}

/// Receives monotonically increasing progress percentages.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait ProgressSink: Send + Sync {
    fn report(&self, percent: u8);
}

/// Progress sink that just logs each milestone.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn report(&self, percent: u8) {
        tracing::info!(percent, "Pipeline progress");
    }
}
