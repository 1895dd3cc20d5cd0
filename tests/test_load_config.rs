use bulsat_epg::load_config::load_config;
use bulsat_epg_core::contract::DeviceProfile;
use serial_test::serial;
use std::env;
use std::fs::write;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::NamedTempFile;

fn config_file(yaml: &str) -> NamedTempFile {
    let file = NamedTempFile::new().expect("temp file");
    write(file.path(), yaml).unwrap();
    file
}

fn clear_credential_env() {
    env::remove_var("BULSAT_USERNAME");
    env::remove_var("BULSAT_PASSWORD");
}

/// A full config maps every key onto the pipeline config.
#[tokio::test]
#[serial]
async fn test_load_config_full_file() {
    clear_credential_env();
    let file = config_file(
        r#"
username: alice
password: secret
device_profile: 0
api_url: http://localhost:9000
timeout_secs: 5
download_epg: false
debug: true
blocked_genres: "Kids, Adult"
max_retries: 5
retry_delay_secs: 1
output_dir: ./tmp/out
playlist_file: tv.m3u
guide_file: tv.xml
state_file: tv-state.json
refresh_interval_hours: 12
"#,
    );

    let config = load_config(file.path()).expect("Config should load");
    assert!(config.debug);
    assert_eq!(config.state_path(), PathBuf::from("./tmp/out/tv-state.json"));

    let pipeline = config.pipeline_config();
    assert_eq!(pipeline.credential.username, "alice");
    assert_eq!(pipeline.credential.password, "secret");
    assert_eq!(pipeline.credential.profile, DeviceProfile::PcWeb);
    assert_eq!(pipeline.client.api_url, "http://localhost:9000");
    assert_eq!(pipeline.client.timeout, Duration::from_secs(5));
    assert!(!pipeline.download_epg);
    assert_eq!(pipeline.blocked_genres, "Kids, Adult");
    assert_eq!(pipeline.retry.max_attempts, 5);
    assert_eq!(pipeline.retry.delay, Duration::from_secs(1));
    assert_eq!(pipeline.output.playlist, PathBuf::from("./tmp/out/tv.m3u"));
    assert_eq!(pipeline.output.guide, PathBuf::from("./tmp/out/tv.xml"));
    assert_eq!(config.refresh_interval_hours(), 12);
}

/// Absent keys fall back to the documented defaults.
#[tokio::test]
#[serial]
async fn test_load_config_defaults() {
    clear_credential_env();
    let file = config_file("username: bob\npassword: pw\n");

    let config = load_config(file.path()).expect("Config should load");
    let pipeline = config.pipeline_config();
    assert_eq!(pipeline.credential.profile, DeviceProfile::SamsungTv);
    assert_eq!(pipeline.client.api_url, "https://api.iptv.bulsat.com");
    assert_eq!(pipeline.client.timeout, Duration::from_secs(10));
    assert!(pipeline.download_epg);
    assert!(!config.debug);
    assert_eq!(pipeline.retry.max_attempts, 3);
    assert_eq!(pipeline.retry.delay, Duration::from_secs(2));
    assert_eq!(pipeline.output.playlist, PathBuf::from("./bulsatcom.m3u"));
    assert_eq!(pipeline.output.guide, PathBuf::from("./bulsatcom.xml"));
    assert_eq!(config.state_path(), PathBuf::from("./bulsatcom-state.json"));
    assert_eq!(config.refresh_interval_hours(), 6);
}

/// Environment credentials take precedence over the file.
#[tokio::test]
#[serial]
async fn test_load_config_env_overrides_credentials() {
    clear_credential_env();
    let file = config_file("username: from-file\npassword: file-pw\n");

    env::set_var("BULSAT_USERNAME", "from-env");
    env::set_var("BULSAT_PASSWORD", "env-pw");
    let config = load_config(file.path()).expect("Config should load");
    clear_credential_env();

    assert_eq!(config.username, "from-env");
    assert_eq!(config.password, "env-pw");
}

/// An empty environment value does not blank out the file value.
#[tokio::test]
#[serial]
async fn test_load_config_ignores_empty_env() {
    clear_credential_env();
    let file = config_file("username: from-file\npassword: file-pw\n");

    env::set_var("BULSAT_PASSWORD", "");
    let config = load_config(file.path()).expect("Config should load");
    clear_credential_env();

    assert_eq!(config.password, "file-pw");
}

#[tokio::test]
#[serial]
async fn test_load_config_rejects_unknown_device_profile() {
    clear_credential_env();
    let file = config_file("device_profile: 7\n");

    let err = load_config(file.path()).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("YAML"), "Parse error expected, got: {msg}");
    assert!(msg.contains("device profile"), "Profile error expected, got: {msg}");
}

#[tokio::test]
#[serial]
async fn test_load_config_refresh_interval_is_clamped() {
    clear_credential_env();
    let low = config_file("refresh_interval_hours: 0\nmin_refresh_interval_hours: 2\n");
    let high = config_file("refresh_interval_hours: 100\n");

    assert_eq!(load_config(low.path()).unwrap().refresh_interval_hours(), 2);
    assert_eq!(load_config(high.path()).unwrap().refresh_interval_hours(), 24);
}

#[tokio::test]
#[serial]
async fn test_load_config_rejects_inverted_bounds_and_zero_timeout() {
    clear_credential_env();
    let inverted = config_file("min_refresh_interval_hours: 30\nmax_refresh_interval_hours: 10\n");
    let err = load_config(inverted.path()).unwrap_err();
    assert!(format!("{err:#}").contains("min_refresh_interval_hours"));

    let zero = config_file("timeout_secs: 0\n");
    let err = load_config(zero.path()).unwrap_err();
    assert!(format!("{err:#}").contains("timeout_secs"));
}

/// This test ensures that if the config file is not valid YAML, load_config errors and reports as such.
#[tokio::test]
#[serial]
async fn test_load_config_errors_for_invalid_file() {
    clear_credential_env();
    let file = config_file("not-yaml: [:::");

    let err = load_config(file.path()).unwrap_err();
    let msg = err.to_string();
    assert!(
        msg.contains("parse") || msg.contains("YAML"),
        "Parse error expected, got: {msg}"
    );
}

#[tokio::test]
#[serial]
async fn test_load_config_debug_output_redacts_password() {
    clear_credential_env();
    let file = config_file("username: alice\npassword: hunter2\n");

    let config = load_config(file.path()).unwrap();
    let rendered = format!("{config:?}");
    assert!(rendered.contains("alice"));
    assert!(!rendered.contains("hunter2"));
}
