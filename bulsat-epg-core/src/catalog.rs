//! Channel catalog retrieval.
//!
//! The listing endpoint answers with either a JSON array of channel records
//! or an object mapping opaque keys to records. Both are flattened into one
//! ordered list (object order is response order). Entries are decoded one by
//! one; a record that fails to decode is logged and skipped.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{info, warn};

use crate::contract::{Channel, Session};
use crate::error::{Error, Result};
use crate::session::{ensure_success, HEADER_SESSION};

/// Separator used when the backend packs several stream URLs into one string.
pub const SOURCE_SEPARATOR: char = '|';

#[derive(Debug, Deserialize)]
struct RawChannel {
    #[serde(rename = "channel", default, deserialize_with = "opaque_text")]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    epg_name: Option<String>,
    #[serde(default)]
    sources: Option<RawSources>,
    #[serde(default)]
    radio: Option<RawFlag>,
    #[serde(default)]
    genre: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawSources {
    Packed(String),
    List(Vec<String>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawFlag {
    Bool(bool),
    Number(i64),
    Text(String),
}

impl RawFlag {
    fn is_set(&self) -> bool {
        match self {
            RawFlag::Bool(b) => *b,
            RawFlag::Number(n) => *n != 0,
            RawFlag::Text(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
        }
    }
}

impl From<RawChannel> for Channel {
    fn from(raw: RawChannel) -> Self {
        let sources = match raw.sources {
            Some(RawSources::Packed(s)) => split_sources(s.split(SOURCE_SEPARATOR)),
            Some(RawSources::List(list)) => split_sources(list.iter().map(String::as_str)),
            None => Vec::new(),
        };
        Channel {
            id: raw.id.unwrap_or_default(),
            title: raw.title.map(|t| t.trim().to_string()).unwrap_or_default(),
            epg_name: raw.epg_name.map(|e| e.trim().to_string()).unwrap_or_default(),
            sources,
            is_radio: raw.radio.map(|r| r.is_set()).unwrap_or(false),
            genre: raw
                .genre
                .map(|g| g.trim().to_string())
                .filter(|g| !g.is_empty()),
            program: None,
        }
    }
}

fn split_sources<'a>(parts: impl Iterator<Item = &'a str>) -> Vec<String> {
    parts
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Accepts a string, number or bool and keeps its textual form.
pub(crate) fn opaque_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a scalar, found {other}"
        ))),
    }
}

/// Decodes a catalog body. Only a body that is neither a list nor an object is an error.
pub fn decode_channels(body: Value) -> Result<Vec<Channel>> {
    let entries: Vec<(String, Value)> = match body {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        Value::Object(map) => map.into_iter().collect(),
        other => {
            return Err(Error::Fetch(format!(
                "channel listing is neither a list nor a map: {}",
                type_name(&other)
            )))
        }
    };

    let total = entries.len();
    let mut channels = Vec::with_capacity(total);
    for (key, value) in entries {
        match serde_json::from_value::<RawChannel>(value) {
            Ok(raw) => channels.push(Channel::from(raw)),
            Err(e) => warn!(entry = %key, error = %e, "Skipping undecodable channel entry"),
        }
    }
    if channels.len() < total {
        warn!(
            decoded = channels.len(),
            total,
            "Some channel entries could not be decoded"
        );
    }
    Ok(channels)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Fetches the live channel listing for the session's platform.
pub async fn fetch_channels(
    http: &reqwest::Client,
    api_url: &str,
    session: &Session,
) -> Result<Vec<Channel>> {
    let token = session.require_token()?;
    let url = format!(
        "{}/tv/{}/live",
        api_url.trim_end_matches('/'),
        session.profile().identity()
    );
    info!(url = %url, "Fetching channel catalog");

    let response = http
        .post(&url)
        .header(HEADER_SESSION, token)
        .send()
        .await
        .map_err(|e| Error::Fetch(format!("request to {url} failed: {e}")))?;
    ensure_success(&response, &url).map_err(|e| Error::Fetch(e.to_string()))?;

    let body: Value = response
        .json()
        .await
        .map_err(|e| Error::Fetch(format!("channel listing is not JSON: {e}")))?;
    let channels = decode_channels(body)?;
    info!(channels = channels.len(), "Fetched channel catalog");
    Ok(channels)
}
