use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tempfile::tempdir;

use super::*;

fn heartbeat_envelope(id: &str) -> Value {
    json!({
        "version": patze_core::TELEMETRY_VERSION,
        "id": id,
        "ts": chrono::Utc::now(),
        "machineId": "m1",
        "severity": "info",
        "type": "machine.heartbeat",
        "payload": { "resource": { "cpuPct": 1.0, "memoryBytes": 2, "memoryPct": 3.0 } },
        "trace": { "trace_id": "t1" },
    })
}

fn test_sink(capacity: usize) -> Arc<HttpSink> {
    let (sink, _handle) = HttpSink::spawn(
        "http://127.0.0.1:1".to_string(),
        None,
        capacity,
        10,
        Duration::from_secs(3600),
        1,
    );
    sink
}

#[test]
fn ingest_accepts_valid_envelope() {
    let sink = test_sink(10);
    sink.ingest(heartbeat_envelope("evt-1")).unwrap();
    assert_eq!(sink.stats().queue_len, 1);
}

#[test]
fn ingest_rejects_malformed_envelope() {
    let sink = test_sink(10);
    let err = sink.ingest(json!({ "not": "an envelope" })).unwrap_err();
    assert!(matches!(err, SinkError::InvalidEnvelope(_)));
}

#[test]
fn ingest_rejects_when_queue_full() {
    let sink = test_sink(1);
    sink.ingest(heartbeat_envelope("evt-1")).unwrap();
    let err = sink.ingest(heartbeat_envelope("evt-2")).unwrap_err();
    match err {
        SinkError::InvalidEnvelope(msg) => assert!(msg.contains("queue full")),
    }
}

#[test]
fn requeue_front_preserves_original_order() {
    let sink = test_sink(10);
    sink.ingest(heartbeat_envelope("evt-1")).unwrap();
    sink.ingest(heartbeat_envelope("evt-2")).unwrap();
    let chunk: Vec<Value> = {
        let mut state = sink.state.lock();
        state.queue.drain(..).collect()
    };
    sink.requeue_front(chunk);
    let state = sink.state.lock();
    assert_eq!(state.queue[0]["id"], "evt-1");
    assert_eq!(state.queue[1]["id"], "evt-2");
}

#[tokio::test]
async fn persist_and_hydrate_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("spool.json");
    let (sink, handle) = HttpSink::spawn(
        "http://127.0.0.1:1".to_string(),
        Some(path.clone()),
        10,
        10,
        Duration::from_secs(3600),
        1,
    );
    sink.ingest(heartbeat_envelope("evt-1")).unwrap();
    sink.persist_now();
    assert!(path.exists());
    handle.shutdown().await;

    let (hydrated, handle2) =
        HttpSink::spawn("http://127.0.0.1:1".to_string(), Some(path), 10, 10, Duration::from_secs(3600), 1);
    assert_eq!(hydrated.stats().queue_len, 1);
    handle2.shutdown().await;
}
