//! Error types for bulsat-epg-core
//!
//! One enum covers every stage of a run. The variants split into three groups:
//! - terminal handshake failures (`Crypto`, `Protocol`, `Authentication`)
//! - transient transport failures (`Network`, `Status`), retried around login
//! - stage failures that abort the run (`Fetch`, `EmptyCatalog`, `Io`, ...)
//!
//! See [`crate::retry::IsRetryable`] for the retry classification.

use thiserror::Error;

/// Result type alias for bulsat-epg-core operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The server-supplied key cannot drive the block cipher
    #[error("crypto error: {0}")]
    Crypto(String),

    /// The handshake response is missing required headers
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The backend rejected the credentials
    #[error("authentication rejected for user {user}")]
    Authentication { user: String },

    /// Login kept failing with transient errors until the attempt budget ran out
    #[error("failed to login after {attempts} attempts: {source}")]
    LoginExhausted {
        attempts: u32,
        #[source]
        source: Box<Error>,
    },

    /// Channel catalog could not be retrieved at all
    #[error("channel fetch failed: {0}")]
    Fetch(String),

    /// Catalog request succeeded but produced no usable channels
    #[error("channel catalog is empty")]
    EmptyCatalog,

    #[error("username and password are required")]
    MissingCredentials,

    /// The run was cancelled before the catalog was fetched
    #[error("run cancelled")]
    Cancelled,

    /// A data request was attempted with a session that never completed the handshake
    #[error("session is not authenticated")]
    Unauthenticated,

    /// Backend answered with a non-success HTTP status
    #[error("unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}
