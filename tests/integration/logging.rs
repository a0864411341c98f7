//! Integration tests for logging and tracing

use crate::common::fake_api::FakeApi;
use bgg_client::HotItemKind;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Collects formatted log output in memory
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Captured {
    type Writer = Captured;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn capture(filter: &str) -> (Captured, tracing::subscriber::DefaultGuard) {
    let captured = Captured::default();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(captured.clone())
        .with_ansi(false)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (captured, guard)
}

#[test]
fn test_tracing_subscriber_initialization() {
    // Either succeeds or fails because already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bgg_client=debug")),
        )
        .with_test_writer()
        .try_init();
}

#[test]
fn test_json_format_fields() {
    let captured = Captured::default();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::new("info"))
        .with_writer(captured.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        info!(guild = 1229, members = 30, "Fetched guild");
    });

    let line = captured.text();
    let value: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
    assert_eq!(value["level"], "INFO");
    assert_eq!(value["fields"]["message"], "Fetched guild");
    assert_eq!(value["fields"]["guild"], 1229);
}

#[tokio::test(start_paused = true)]
async fn test_retries_are_logged_as_warnings() {
    let (captured, _guard) = capture("bgg_client=debug");

    let api = FakeApi::new();
    api.respond_status("hot", 1, 202, "<message>accepted</message>");
    api.respond("hot", 1, "<items/>");
    let bgg = api.client(3, Duration::from_secs(1));

    bgg.hot_items(HotItemKind::BoardGame).await.unwrap();

    let logs = captured.text();
    assert!(logs.contains("WARN"));
    assert!(logs.contains("Retrying (attempt 2/4) after request queued by server"));
}

#[tokio::test]
async fn test_exhausted_budget_logs_failure_with_suggestion() {
    let (captured, _guard) = capture("bgg_client=info");

    let api = FakeApi::new();
    api.time_out("hot", 1);
    let bgg = api.client(1, Duration::ZERO);

    assert!(bgg.hot_items(HotItemKind::BoardGame).await.is_err());

    let logs = captured.text();
    assert!(logs.contains("ERROR"));
    assert!(logs.contains("[FAILED] Request failed after 2 attempts"));
    assert!(logs.contains("Raise --timeout"));
}

#[test]
fn test_log_filtering() {
    let (captured, _guard) = capture("bgg_client::fetcher=debug,bgg_client=warn");

    tracing::debug!(target: "bgg_client::fetcher::bgg_http", "fetcher detail");
    tracing::debug!(target: "bgg_client::client", "client detail");

    let logs = captured.text();
    assert!(logs.contains("fetcher detail"));
    assert!(!logs.contains("client detail"));
}
