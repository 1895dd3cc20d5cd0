//! Session negotiation against the Bulsatcom auth endpoint.
//!
//! The handshake is a small state machine:
//!
//! ```text
//! Unauthenticated --first response, logged=true--> Authenticated
//! Unauthenticated --first response--------------> ChallengeReceived
//! ChallengeReceived --logged=true---------------> Authenticated
//! ChallengeReceived --anything else-------------> Err(Authentication)
//! ```
//!
//! Every transition reads response headers only, so each can be exercised
//! without a server. [`negotiate`] drives the machine over HTTP.

use std::fmt;

use reqwest::header::HeaderMap;
use tracing::{debug, info, warn};

use crate::cipher;
use crate::contract::{Credential, DeviceProfile, Session};
use crate::error::{Error, Result};

pub const HEADER_CHALLENGE: &str = "challenge";
pub const HEADER_SESSION: &str = "ssbulsatapi";
pub const HEADER_LOGGED: &str = "logged";
pub const APP_VERSION: &str = "0.01";

pub enum HandshakeState {
    Unauthenticated,
    ChallengeReceived { challenge: String, session: Session },
    Authenticated(Session),
}

impl fmt::Debug for HandshakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandshakeState::Unauthenticated => f.write_str("Unauthenticated"),
            HandshakeState::ChallengeReceived { session, .. } => f
                .debug_struct("ChallengeReceived")
                .field("session", session)
                .finish_non_exhaustive(),
            HandshakeState::Authenticated(session) => {
                f.debug_tuple("Authenticated").field(session).finish()
            }
        }
    }
}

impl HandshakeState {
    /// Consumes the headers of the unauthenticated first request.
    pub fn on_first_response(self, profile: DeviceProfile, headers: &HeaderMap) -> Result<Self> {
        if !matches!(self, HandshakeState::Unauthenticated) {
            return Err(Error::Protocol(format!(
                "first handshake response received in state {self:?}"
            )));
        }

        let challenge = header_text(headers, HEADER_CHALLENGE)?
            .ok_or_else(|| Error::Protocol("missing challenge header".into()))?;
        let token = header_text(headers, HEADER_SESSION)?
            .ok_or_else(|| Error::Protocol("missing ssbulsatapi header".into()))?;
        let session = Session::pending(token, profile);

        if logged_in(headers)? {
            return Ok(HandshakeState::Authenticated(session.authenticate()));
        }
        Ok(HandshakeState::ChallengeReceived { challenge, session })
    }

    /// Consumes the headers of the credential submission.
    pub fn on_credential_response(self, username: &str, headers: &HeaderMap) -> Result<Self> {
        let session = match self {
            HandshakeState::ChallengeReceived { session, .. } => session,
            other => {
                return Err(Error::Protocol(format!(
                    "credential response received in state {other:?}"
                )))
            }
        };
        if logged_in(headers)? {
            Ok(HandshakeState::Authenticated(session.authenticate()))
        } else {
            Err(Error::Authentication {
                user: username.to_string(),
            })
        }
    }
}

/// Form body for the credential submission. Every identity field carries the
/// profile's identity string.
pub fn credential_form(credential: &Credential, encrypted_password: String) -> Vec<(&'static str, String)> {
    let identity = credential.profile.identity().to_string();
    vec![
        ("user", credential.username.clone()),
        ("device_id", identity.clone()),
        ("device_name", identity.clone()),
        ("os_version", identity.clone()),
        ("os_type", identity),
        ("app_version", APP_VERSION.to_string()),
        ("pass", encrypted_password),
    ]
}

/// Runs one full handshake. Returns an authenticated [`Session`].
pub async fn negotiate(
    http: &reqwest::Client,
    api_url: &str,
    credential: &Credential,
) -> Result<Session> {
    let url = format!("{}{}", api_url.trim_end_matches('/'), credential.profile.auth_path());
    info!(user = %credential.username, profile = ?credential.profile, "Starting login handshake");

    let response = http.post(&url).send().await?;
    ensure_success(&response, &url)?;
    let state = HandshakeState::Unauthenticated.on_first_response(credential.profile, response.headers())?;

    let (challenge, session) = match state {
        HandshakeState::Authenticated(session) => {
            info!(user = %credential.username, "Backend reports session already logged in");
            return Ok(session);
        }
        HandshakeState::ChallengeReceived { challenge, session } => (challenge, session),
        HandshakeState::Unauthenticated => {
            return Err(Error::Protocol("handshake did not advance".into()))
        }
    };
    debug!(session = ?session, "Challenge received");

    let encrypted = cipher::encrypt(credential.password.as_bytes(), challenge.as_bytes())?;
    let form = credential_form(credential, encrypted);
    let response = http
        .post(&url)
        .header(HEADER_SESSION, session.token())
        .form(&form)
        .send()
        .await?;
    ensure_success(&response, &url)?;

    let state = HandshakeState::ChallengeReceived { challenge, session }
        .on_credential_response(&credential.username, response.headers());
    match state {
        Ok(HandshakeState::Authenticated(session)) => {
            info!(user = %credential.username, "Login succeeded");
            Ok(session)
        }
        Ok(other) => Err(Error::Protocol(format!("handshake ended in state {other:?}"))),
        Err(e) => {
            warn!(user = %credential.username, error = %e, "Login rejected");
            Err(e)
        }
    }
}

pub(crate) fn ensure_success(response: &reqwest::Response, url: &str) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(Error::Status {
            status: status.as_u16(),
            url: url.to_string(),
        })
    }
}

fn header_text(headers: &HeaderMap, name: &str) -> Result<Option<String>> {
    match headers.get(name) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .map(|s| Some(s.trim().to_string()))
            .map_err(|_| Error::Protocol(format!("header {name} is not valid text"))),
    }
}

fn logged_in(headers: &HeaderMap) -> Result<bool> {
    Ok(header_text(headers, HEADER_LOGGED)?.as_deref() == Some("true"))
}
