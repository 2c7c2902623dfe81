//! Unit tests for the coordinator
//!
//! End-to-end scenarios over multi-day windows live in the top-level
//! `tests/pipeline.rs`; these cover pre-flight, fetch-only runs, custom
//! filters and progress reporting.

use std::io::Write;
use std::sync::Arc;

use bzip2::write::BzEncoder;
use bzip2::Compression;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::app::models::Record;
use crate::app::storage::StorageConfig;
use crate::errors::{AppError, ConfigError};

use super::*;

/// Compress newline-delimited lines into a bzip2 archive body
fn bz2_body(lines: &[&str]) -> Vec<u8> {
    let mut encoder = BzEncoder::new(Vec::new(), Compression::fast());
    for line in lines {
        writeln!(encoder, "{}", line).unwrap();
    }
    encoder.finish().unwrap()
}

fn test_config(server: &MockServer, temp_dir: &TempDir) -> CoordinatorConfig {
    CoordinatorConfig::default()
        .with_worker_count(2)
        .with_base_url(server.uri())
        .with_storage(StorageConfig::under(temp_dir.path()))
}

fn test_client() -> Arc<AtlasClient> {
    Arc::new(AtlasClient::new().unwrap())
}

#[tokio::test]
async fn test_invalid_config_fails_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let config = test_config(&server, &temp_dir).with_worker_count(0);
    let window = DateWindow::parse("2025-10-01", "2025-10-03").unwrap();

    let result = Coordinator::new(config, test_client()).execute(&window).await;
    assert!(matches!(
        result,
        Err(AppError::Config(ConfigError::InvalidValue { ref field, .. })) if field == "worker_count"
    ));
    assert!(!temp_dir.path().join("raw_dumps").exists());
}

#[tokio::test]
async fn test_unusable_storage_fails_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("blocker");
    std::fs::write(&blocker, b"").unwrap();
    let config = test_config(&server, &temp_dir).with_storage(StorageConfig::under(&blocker));
    let window = DateWindow::single(chrono::NaiveDate::from_ymd_opt(2025, 10, 1).unwrap());

    let result = Coordinator::new(config, test_client()).execute(&window).await;
    assert!(matches!(
        result,
        Err(AppError::Config(ConfigError::StorageUnavailable { .. }))
    ));
}

#[tokio::test]
async fn test_plan_performs_no_io() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let coordinator = Coordinator::new(test_config(&server, &temp_dir), test_client());
    let window = DateWindow::parse("2025-09-30", "2025-10-02").unwrap();

    let plan = coordinator.plan(&window).unwrap();
    let names: Vec<_> = plan.iter().map(|d| d.file_name.as_str()).collect();

    assert_eq!(
        names,
        vec![
            "ping-v4-builtin-2025-09-30.bz2",
            "ping-v4-builtin-2025-10-01.bz2",
            "ping-v4-builtin-2025-10-02.bz2",
        ]
    );
    assert!(plan[0].url.as_str().ends_with("/2025/09/30/ping-v4-builtin-2025-09-30.bz2"));
    assert!(!temp_dir.path().join("raw_dumps").exists());
}

#[tokio::test]
async fn test_fetch_only_skips_processing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2025/10/01/ping-v4-builtin-2025-10-01.bz2"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(bz2_body(&[r#"{"avg": 99}"#])))
        .expect(1)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let config = test_config(&server, &temp_dir).with_fetch_only(true);
    let window = DateWindow::parse("2025-10-01", "2025-10-01").unwrap();

    let result = Coordinator::new(config, test_client())
        .execute(&window)
        .await
        .unwrap();

    assert_eq!(result.stats.fetched, 1);
    assert!(result.processes.is_empty());
    assert!(result.fetch_only);
    assert!(result.summary().contains("Process: skipped"));
    assert!(temp_dir
        .path()
        .join("raw_dumps/ping-v4-builtin-2025-10-01.bz2")
        .exists());
    assert!(std::fs::read_dir(temp_dir.path().join("parsed_dumps"))
        .unwrap()
        .next()
        .is_none());
}

#[tokio::test]
async fn test_custom_filter_and_progress_events() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(bz2_body(&[
            r#"{"prb_id": 1, "avg": 1}"#,
            r#"{"prb_id": 2, "avg": 2}"#,
            r#"{"prb_id": 3, "avg": 3}"#,
        ])))
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let window = DateWindow::parse("2025-10-01", "2025-10-02").unwrap();
    let keep_everything = |_: &Record| true;
    let (tx, mut rx) = mpsc::channel(64);

    let result = Coordinator::new(test_config(&server, &temp_dir), test_client())
        .with_filter(Arc::new(keep_everything))
        .with_progress(tx)
        .execute(&window)
        .await
        .unwrap();

    assert_eq!(result.stats.processed, 2);
    assert_eq!(result.stats.records_kept, 6);

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert_eq!(
        events.first(),
        Some(&ProgressEvent::PhaseStarted {
            phase: Phase::Fetch,
            total: 2
        })
    );
    assert_eq!(
        events.last(),
        Some(&ProgressEvent::PhaseFinished {
            phase: Phase::Process
        })
    );
    let processed = events
        .iter()
        .filter(|e| {
            matches!(
                e,
                ProgressEvent::ItemFinished {
                    phase: Phase::Process,
                    outcome: "processed"
                }
            )
        })
        .count();
    assert_eq!(processed, 2);
}

#[tokio::test]
async fn test_panicking_filter_fails_only_its_archive() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2025/10/01/ping-v4-builtin-2025-10-01.bz2"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(bz2_body(&[r#"{"avg": 60}"#])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/2025/10/02/ping-v4-builtin-2025-10-02.bz2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_bytes(bz2_body(&[r#"{"avg": 60, "poison": true}"#])),
        )
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let window = DateWindow::parse("2025-10-01", "2025-10-02").unwrap();
    let picky = |record: &Record| {
        if record.contains_key("poison") {
            panic!("poisoned record");
        }
        true
    };

    let result = Coordinator::new(test_config(&server, &temp_dir), test_client())
        .with_filter(Arc::new(picky))
        .execute(&window)
        .await
        .unwrap();

    let first = chrono::NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
    let second = chrono::NaiveDate::from_ymd_opt(2025, 10, 2).unwrap();
    assert!(matches!(
        result.process_outcome(first),
        Some(ProcessOutcome::Processed(_))
    ));
    assert!(matches!(
        result.process_outcome(second),
        Some(ProcessOutcome::Failed(_))
    ));
    assert_eq!(result.stats.process_failed, 1);
}
