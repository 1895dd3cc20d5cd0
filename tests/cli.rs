use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::write;
use tempfile::{tempdir, NamedTempFile};

/// Writes a config whose outputs land in `output_dir`.
fn config_with(output_dir: &std::path::Path, extra: &str) -> NamedTempFile {
    let config = NamedTempFile::new().expect("Creating temp config file failed");
    let yaml = format!(
        "username: \"\"\npassword: \"\"\ndevice_profile: 0\noutput_dir: {}\n{extra}",
        output_dir.display()
    );
    write(config.path(), yaml).expect("Writing temp config failed");
    config
}

fn bin() -> Command {
    let mut cmd = Command::cargo_bin("bulsat-epg").expect("Binary exists");
    cmd.env_remove("BULSAT_USERNAME").env_remove("BULSAT_PASSWORD");
    cmd
}

#[test]
fn help_lists_subcommands() {
    bin()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("run")
                .and(predicate::str::contains("status"))
                .and(predicate::str::contains("interval")),
        );
}

#[test]
fn run_with_missing_config_file_fails() {
    bin()
        .args(["run", "--config", "/definitely/not/here.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn run_without_credentials_fails_and_records_error() {
    let out = tempdir().unwrap();
    let config = config_with(out.path(), "");

    bin()
        .arg("run")
        .arg("--config")
        .arg(config.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("username and password are required"));

    let state = std::fs::read_to_string(out.path().join("bulsatcom-state.json"))
        .expect("failed run still records state");
    assert!(state.contains("username and password are required"));
    assert!(!out.path().join("bulsatcom.m3u").exists());
    assert!(!out.path().join("bulsatcom.xml").exists());
}

#[test]
fn status_without_previous_run_prints_empty_state() {
    let out = tempdir().unwrap();
    let config = config_with(out.path(), "");

    bin()
        .arg("status")
        .arg("--config")
        .arg(config.path())
        .assert()
        .success()
        .stdout(
            predicate::str::contains("\"total_channels\": 0")
                .and(predicate::str::contains("\"last_successful_update\": null")),
        );
}

#[test]
fn interval_is_clamped_to_maximum() {
    let out = tempdir().unwrap();
    let config = config_with(out.path(), "refresh_interval_hours: 48\nmax_refresh_interval_hours: 24\n");

    bin()
        .arg("interval")
        .arg("--config")
        .arg(config.path())
        .assert()
        .success()
        .stdout(predicate::eq("24\n"));
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*; // needed for .with()
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        use std::fmt::Write as FmtWrite;
        let mut msg = String::new();
        let _ = write!(&mut msg, "{:?}", event);
        self.events.lock().unwrap().push(msg);
    }
}

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use bulsat_epg::cli::{run, Cli, Commands};
    use tokio_util::sync::CancellationToken;

    let cli = Cli {
        debug: false,
        command: Commands::Interval {
            config: std::path::PathBuf::from("dummy.yaml"),
        },
    };

    let _ = run(cli, CancellationToken::new()).await;

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}
