/// `load_config` module: Loads a static YAML config, injects credentials from the
/// environment and adapts it into the core's [`PipelineConfig`].
///
/// This module is the only place where untrusted YAML is parsed and mapped to
/// strongly-typed core structs.
///
/// # Responsibilities
/// - Parse the YAML file into [`CliConfig`], filling defaults for absent keys
/// - Override `username`/`password` with `BULSAT_USERNAME`/`BULSAT_PASSWORD` when set
/// - Reject values the core cannot run with (zero timeout, inverted refresh bounds)
/// - Derive output paths and the clamped refresh interval
///
/// # Errors
/// All errors in this module use `anyhow::Error` and are surfaced at the CLI boundary.
///
use anyhow::{bail, Context, Result};
use bulsat_epg_core::client::{ClientSettings, DEFAULT_API_URL};
use bulsat_epg_core::config::{OutputPaths, PipelineConfig};
use bulsat_epg_core::contract::{Credential, DeviceProfile};
use bulsat_epg_core::retry::RetryPolicy;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

pub const ENV_USERNAME: &str = "BULSAT_USERNAME";
pub const ENV_PASSWORD: &str = "BULSAT_PASSWORD";

#[derive(Clone, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub device_profile: DeviceProfile,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_true")]
    pub download_epg: bool,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub blocked_genres: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_playlist_file")]
    pub playlist_file: String,
    #[serde(default = "default_guide_file")]
    pub guide_file: String,
    #[serde(default = "default_state_file")]
    pub state_file: String,
    #[serde(default = "default_refresh_interval_hours")]
    pub refresh_interval_hours: u32,
    #[serde(default = "default_min_refresh_interval_hours")]
    pub min_refresh_interval_hours: u32,
    #[serde(default = "default_max_refresh_interval_hours")]
    pub max_refresh_interval_hours: u32,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_true() -> bool {
    true
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_delay_secs() -> u64 {
    2
}
fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_playlist_file() -> String {
    "bulsatcom.m3u".to_string()
}
fn default_guide_file() -> String {
    "bulsatcom.xml".to_string()
}
fn default_state_file() -> String {
    "bulsatcom-state.json".to_string()
}
fn default_refresh_interval_hours() -> u32 {
    6
}
fn default_min_refresh_interval_hours() -> u32 {
    1
}
fn default_max_refresh_interval_hours() -> u32 {
    24
}

impl fmt::Debug for CliConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CliConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("device_profile", &self.device_profile)
            .field("api_url", &self.api_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("download_epg", &self.download_epg)
            .field("debug", &self.debug)
            .field("blocked_genres", &self.blocked_genres)
            .field("max_retries", &self.max_retries)
            .field("retry_delay_secs", &self.retry_delay_secs)
            .field("output_dir", &self.output_dir)
            .field("refresh_interval_hours", &self.refresh_interval_hours)
            .finish_non_exhaustive()
    }
}

impl CliConfig {
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            credential: Credential {
                username: self.username.clone(),
                password: self.password.clone(),
                profile: self.device_profile,
            },
            client: ClientSettings {
                api_url: self.api_url.clone(),
                timeout: Duration::from_secs(self.timeout_secs),
            },
            download_epg: self.download_epg,
            blocked_genres: self.blocked_genres.clone(),
            retry: RetryPolicy {
                max_attempts: self.max_retries,
                delay: Duration::from_secs(self.retry_delay_secs),
            },
            output: OutputPaths {
                playlist: self.output_dir.join(&self.playlist_file),
                guide: self.output_dir.join(&self.guide_file),
            },
        }
    }

    pub fn state_path(&self) -> PathBuf {
        self.output_dir.join(&self.state_file)
    }

    /// Refresh interval for the external scheduler, kept within the configured bounds.
    pub fn refresh_interval_hours(&self) -> u32 {
        self.refresh_interval_hours
            .max(self.min_refresh_interval_hours)
            .min(self.max_refresh_interval_hours)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(username) = non_empty_env(ENV_USERNAME) {
            info!(env = ENV_USERNAME, "Username taken from environment");
            self.username = username;
        }
        if let Some(password) = non_empty_env(ENV_PASSWORD) {
            info!(env = ENV_PASSWORD, "Password taken from environment");
            self.password = password;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be greater than zero");
        }
        if self.min_refresh_interval_hours > self.max_refresh_interval_hours {
            bail!(
                "min_refresh_interval_hours ({}) exceeds max_refresh_interval_hours ({})",
                self.min_refresh_interval_hours,
                self.max_refresh_interval_hours
            );
        }
        for (key, name) in [
            ("playlist_file", &self.playlist_file),
            ("guide_file", &self.guide_file),
            ("state_file", &self.state_file),
        ] {
            if name.trim().is_empty() {
                bail!("{key} must not be empty");
            }
        }
        Ok(())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Loads a static YAML config file and injects credentials from the environment.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let mut config: CliConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    config.apply_env_overrides();
    config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", path_ref.display()))?;
    Ok(config)
}
