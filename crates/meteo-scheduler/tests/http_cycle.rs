// End-to-end cycles against a mock HTTP server: fetch, convert, snapshot
// and history append all run for real.

use meteo_feed::{FetchOptions, HttpFetcher};
use meteo_scheduler::IngestEngine;
use meteo_store::{ReadingStore, SnapshotWriter};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Setup {
    _dir: tempfile::TempDir,
    store: ReadingStore,
    snapshot: SnapshotWriter,
    engine: IngestEngine,
}

fn setup(server: &MockServer) -> Setup {
    let dir = tempfile::tempdir().unwrap();
    let store = ReadingStore::new(dir.path().join("meteo.db"));
    store.ensure_ready().unwrap();
    let snapshot = SnapshotWriter::new(dir.path().join("data.json"));
    let fetcher = HttpFetcher::new(
        format!("{}/raw/PMQueqDV", server.uri()),
        FetchOptions::default(),
    )
    .unwrap();
    let engine = IngestEngine::new(
        Box::new(fetcher),
        store.clone(),
        snapshot.clone(),
        Duration::from_secs(60),
        None,
    );
    Setup {
        _dir: dir,
        store,
        snapshot,
        engine,
    }
}

fn snapshot_json(setup: &Setup) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(setup.snapshot.path()).unwrap()).unwrap()
}

#[tokio::test]
async fn xml_feed_becomes_stamped_snapshot_and_history_row() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/raw/PMQueqDV"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<?xml version="1.0"?><meteo station="LKTB"><temp unit="C">3.5</temp></meteo>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let setup = setup(&server);
    let report = setup.engine.run_cycle().await;
    assert!(report.reading.is_available());

    let snap = snapshot_json(&setup);
    assert_eq!(snap["meteo"]["@station"], "LKTB");
    assert_eq!(snap["meteo"]["temp"]["#text"], "3.5");
    assert_eq!(snap["timestamp"], report.reading.timestamp_iso().as_str());

    let rows = setup.store.recent(5).unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].is_available);
    assert!(rows[0].error_message.is_none());
    assert!(rows[0].source_url.ends_with("/raw/PMQueqDV"));
}

#[tokio::test]
async fn not_found_is_recorded_as_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let setup = setup(&server);
    let report = setup.engine.run_cycle().await;
    assert!(!report.reading.is_available());
    assert!(report.snapshot_written);
    assert!(report.row_id.is_some());

    let snap = snapshot_json(&setup);
    assert_eq!(snap["is_available"], false);
    assert!(snap["error"].as_str().unwrap().contains("404"));
    assert!(snap["timestamp"].is_string());

    let rows = setup.store.recent(5).unwrap();
    assert_eq!(rows.len(), 1);
    assert!(!rows[0].is_available);
    assert!(rows[0].payload_json.is_none());
    assert!(rows[0].error_message.as_deref().unwrap().contains("404"));
}

#[tokio::test]
async fn every_cycle_appends_exactly_one_row() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not xml at all"))
        .mount(&server)
        .await;

    let setup = setup(&server);
    for _ in 0..3 {
        setup.engine.run_cycle().await;
    }
    assert_eq!(setup.store.count().unwrap(), 3);
    let snap = snapshot_json(&setup);
    assert!(snap["error"].as_str().unwrap().starts_with("Invalid XML"));
}
