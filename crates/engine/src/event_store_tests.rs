// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chrono::Utc;
use patze_core::{EventId, EventType, MachineId, Severity, TraceContext};
use serde_json::json;

use super::*;

fn envelope(id: &str) -> Envelope {
    Envelope {
        version: "telemetry.v1".into(),
        id: EventId::new(id),
        ts: Utc::now(),
        machine_id: MachineId::new("m1"),
        severity: Severity::Info,
        event_type: EventType::MachineHeartbeat,
        payload: json!({ "resource": { "cpuPct": 1.0, "memoryBytes": 1, "memoryPct": 1.0 } }),
        trace: TraceContext { trace_id: "t1".into(), span_id: None, parent_span_id: None },
    }
}

#[test]
fn append_preserves_order() {
    let store = EventStore::new(10);
    store.append(envelope("e1"));
    store.append(envelope("e2"));
    let all = store.events_since(None).unwrap();
    assert_eq!(all.iter().map(|e| e.id.as_str()).collect::<Vec<_>>(), vec!["e1", "e2"]);
}

#[test]
fn bulk_eviction_keeps_only_capacity_newest() {
    let store = EventStore::new(2);
    store.append(envelope("e1"));
    store.append(envelope("e2"));
    store.append(envelope("e3"));
    let all = store.events_since(None).unwrap();
    assert_eq!(all.iter().map(|e| e.id.as_str()).collect::<Vec<_>>(), vec!["e2", "e3"]);
}

#[test]
fn subscribers_receive_events_in_append_order() {
    let store = EventStore::new(10);
    let mut rx = store.subscribe();
    store.append(envelope("e1"));
    store.append(envelope("e2"));
    assert_eq!(rx.try_recv().unwrap().id.as_str(), "e1");
    assert_eq!(rx.try_recv().unwrap().id.as_str(), "e2");
}

#[test]
fn events_since_returns_only_newer_events() {
    let store = EventStore::new(10);
    store.append(envelope("e1"));
    store.append(envelope("e2"));
    store.append(envelope("e3"));
    let since = store.events_since(Some("e1")).unwrap();
    assert_eq!(since.iter().map(|e| e.id.as_str()).collect::<Vec<_>>(), vec!["e2", "e3"]);
}

#[test]
fn events_since_unknown_id_signals_refetch() {
    let store = EventStore::new(10);
    store.append(envelope("e1"));
    assert!(store.events_since(Some("evicted-long-ago")).is_none());
}

#[test]
fn reappending_same_machine_and_id_is_a_no_op() {
    let store = EventStore::new(10);
    assert!(store.append(envelope("e1")).is_some());
    assert!(store.append(envelope("e1")).is_none());
    let all = store.events_since(None).unwrap();
    assert_eq!(all.len(), 1);
}

#[test]
fn seen_set_forgets_evicted_ids_so_they_can_recur() {
    let store = EventStore::new(1);
    store.append(envelope("e1"));
    store.append(envelope("e2"));
    // e1 was evicted to make room for e2; its id is no longer tracked, so a
    // fresh envelope reusing it is accepted rather than permanently barred.
    assert!(store.append(envelope("e1")).is_some());
    let all = store.events_since(None).unwrap();
    assert_eq!(all.iter().map(|e| e.id.as_str()).collect::<Vec<_>>(), vec!["e2", "e1"]);
}
