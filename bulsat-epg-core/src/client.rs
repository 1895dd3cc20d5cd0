//! HTTP implementation of the `Backend` trait against the Bulsatcom API.
//!
//! [`BulsatClient`] owns a single `reqwest::Client`. Every request made
//! through it carries the same timeout and the fixed browser-like headers the
//! backend expects. The session token is never stored on the client; it is
//! attached per request from the [`Session`] passed in.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, ORIGIN, REFERER, USER_AGENT};

use crate::contract::{Backend, Channel, Credential, ProgramEntry, Session};
use crate::error::Result;
use crate::{catalog, guide, session};

pub const DEFAULT_API_URL: &str = "https://api.iptv.bulsat.com";
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/61.0.3163.100 Safari/537.36";
pub const WEB_ORIGIN: &str = "https://test.iptv.bulsat.com";
pub const WEB_REFERER: &str = "https://test.iptv.bulsat.com/iptv-login.php";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub api_url: String,
    pub timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

pub struct BulsatClient {
    http: reqwest::Client,
    api_url: String,
}

impl BulsatClient {
    pub fn new(settings: &ClientSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .default_headers(default_headers())
            .build()?;
        tracing::info!(
            api_url = %settings.api_url,
            timeout_secs = settings.timeout.as_secs(),
            "Initialized Bulsatcom client"
        );
        Ok(Self {
            http,
            api_url: settings.api_url.trim_end_matches('/').to_string(),
        })
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("bg-BG,bg;q=0.8,en;q=0.6"));
    headers.insert(ORIGIN, HeaderValue::from_static(WEB_ORIGIN));
    headers.insert(REFERER, HeaderValue::from_static(WEB_REFERER));
    headers
}

#[async_trait]
impl Backend for BulsatClient {
    async fn open_session(&self, credential: &Credential) -> Result<Session> {
        session::negotiate(&self.http, &self.api_url, credential).await
    }

    async fn fetch_channels(&self, session: &Session) -> Result<Vec<Channel>> {
        catalog::fetch_channels(&self.http, &self.api_url, session).await
    }

    async fn fetch_programme(
        &self,
        session: &Session,
        epg_name: &str,
    ) -> Result<Option<ProgramEntry>> {
        guide::fetch_programme(&self.http, &self.api_url, session, epg_name).await
    }
}
