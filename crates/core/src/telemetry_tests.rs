// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

fn envelope(event_type: EventType, payload: Value) -> Envelope {
    Envelope {
        version: TELEMETRY_VERSION.to_string(),
        id: EventId::new("evt-1"),
        ts: Utc::now(),
        machine_id: MachineId::new("m1"),
        severity: Severity::Info,
        event_type,
        payload,
        trace: TraceContext { trace_id: TraceId::new("t1"), span_id: None, parent_span_id: None },
    }
}

#[test]
fn heartbeat_with_full_resource_is_valid() {
    let e = envelope(
        EventType::MachineHeartbeat,
        json!({ "resource": { "cpuPct": 1.0, "memoryBytes": 2, "memoryPct": 3.0 } }),
    );
    assert!(e.validate_shape().is_ok());
}

#[test]
fn heartbeat_missing_resource_field_is_rejected() {
    let e = envelope(EventType::MachineHeartbeat, json!({ "resource": { "cpuPct": 1.0 } }));
    let err = e.validate_shape().unwrap_err();
    assert_eq!(err.code(), "invalid_payload");
}

#[test]
fn wrong_schema_version_is_rejected() {
    let mut e = envelope(EventType::MachineRegistered, json!({ "status": "online" }));
    e.version = "telemetry.v2".to_string();
    assert_eq!(e.validate_shape().unwrap_err().code(), "invalid_schema_version");
}

#[test]
fn empty_trace_id_is_rejected() {
    let mut e = envelope(EventType::MachineRegistered, json!({ "status": "online" }));
    e.trace.trace_id = TraceId::new("");
    assert_eq!(e.validate_shape().unwrap_err().code(), "invalid_trace");
}

#[test]
fn mismatched_payload_machine_id_is_rejected() {
    let e = envelope(
        EventType::MachineRegistered,
        json!({ "status": "online", "machineId": "someone-else" }),
    );
    assert_eq!(e.validate_shape().unwrap_err().code(), "invalid_payload");
}

#[test]
fn matching_payload_machine_id_is_accepted() {
    let e = envelope(
        EventType::MachineRegistered,
        json!({ "status": "online", "machineId": "m1" }),
    );
    assert!(e.validate_shape().is_ok());
}

#[test]
fn oversized_payload_is_rejected() {
    let big = "x".repeat(MAX_PAYLOAD_BYTES + 1);
    let e = envelope(EventType::RunLogEmitted, json!({ "runId": "r1", "line": big }));
    assert_eq!(e.validate_shape().unwrap_err().code(), "invalid_payload");
}

#[test]
fn id_with_newline_is_rejected() {
    let mut e = envelope(EventType::MachineRegistered, json!({ "status": "online" }));
    e.id = EventId::new("evt\n1");
    assert_eq!(e.validate_shape().unwrap_err().code(), "invalid_envelope");
}

#[test]
fn dedup_key_pairs_machine_and_id() {
    let e = envelope(EventType::MachineRegistered, json!({ "status": "online" }));
    assert_eq!(e.dedup_key(), ("m1".to_string(), "evt-1".to_string()));
}

#[test]
fn heartbeat_is_excluded_from_recent_events() {
    assert!(EventType::MachineHeartbeat.is_heartbeat());
    assert!(!EventType::RunStateChanged.is_heartbeat());
}
