use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::write;
use tempfile::{tempdir, NamedTempFile, TempDir};

const DATABASE_ID: &str = "0123456789abcdef0123456789abcdef";

/// Creates a minimal config file for the CLI to read, with the output dir inside `out`.
fn create_minimal_config(out: &TempDir) -> NamedTempFile {
    let config = NamedTempFile::new().expect("Creating temp config file failed");
    let yaml = format!(
        "source:\n  database_id: \"{DATABASE_ID}\"\noutput:\n  dir: {}\n",
        out.path().join("_posts").display()
    );
    write(config.path(), yaml).expect("Writing temp config failed");
    config
}

fn post_sync() -> Command {
    let mut cmd = Command::cargo_bin("post-sync").expect("Binary exists");
    cmd.env_remove("NOTION_TOKEN")
        .env_remove("NOTION_DATABASE_ID")
        .env_remove("NOTION_API_URL");
    cmd
}

#[test]
fn sync_fails_when_config_file_is_missing() {
    post_sync()
        .arg("sync")
        .arg("--config")
        .arg("does-not-exist.yaml")
        .env("NOTION_TOKEN", "secret")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn sync_fails_before_any_request_without_a_token() {
    let out = tempdir().unwrap();
    let config = create_minimal_config(&out);

    post_sync()
        .arg("sync")
        .arg("--config")
        .arg(config.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("NOTION_TOKEN"));

    assert!(!out.path().join("_posts").exists());
}

#[test]
fn sync_fails_when_the_listing_cannot_be_fetched() {
    let out = tempdir().unwrap();
    let config = create_minimal_config(&out);

    // Nothing listens on the discard port, so the listing request is refused.
    post_sync()
        .arg("sync")
        .arg("--config")
        .arg(config.path())
        .env("NOTION_TOKEN", "secret")
        .env("NOTION_API_URL", "http://127.0.0.1:9/v1")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Synchronise starting"))
        .stdout(predicate::str::contains("Synchronise report:"))
        .stdout(predicate::str::contains("Created:   0"))
        .stderr(predicate::str::contains("Synchronise aborted"));

    assert!(!out.path().join("_posts").exists());
}

#[test]
fn sync_without_subcommand_prints_usage() {
    post_sync()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
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
        self.events.lock().unwrap().push(format!("{:?}", event));
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

    use post_sync::cli::{run, Cli, Commands};

    // A dummy path: the run fails on the config, after the first event.
    let cli = Cli {
        command: Commands::Sync {
            config: std::path::PathBuf::from("dummy.yaml"),
        },
    };

    let result = run(cli).await;
    assert!(result.is_err());

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs
            .first()
            .is_some_and(|msg| msg.contains("trace_initialised")),
        "Expected 'trace_initialised' as the first trace event, got: {:?}",
        event_msgs
    );
}
