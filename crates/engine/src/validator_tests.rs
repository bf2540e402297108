// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde_json::json;

use super::*;

fn heartbeat_envelope() -> Value {
    json!({
        "version": "telemetry.v1",
        "id": "evt-1",
        "ts": "2026-07-27T12:00:00Z",
        "machineId": "m1",
        "severity": "info",
        "type": "machine.heartbeat",
        "payload": { "resource": { "cpuPct": 1.0, "memoryBytes": 2, "memoryPct": 3.0 } },
        "trace": { "traceId": "t1" },
    })
}

#[test]
fn valid_heartbeat_parses() {
    let env = validate_and_parse(&heartbeat_envelope()).unwrap();
    assert_eq!(env.machine_id.as_str(), "m1");
}

#[test]
fn bad_timestamp_is_invalid_timestamp_not_a_panic() {
    let mut raw = heartbeat_envelope();
    raw["ts"] = json!("not-a-date");
    let err = validate_and_parse(&raw).unwrap_err();
    assert_eq!(err.code(), "invalid_timestamp");
}

#[test]
fn unknown_severity_is_invalid_severity() {
    let mut raw = heartbeat_envelope();
    raw["severity"] = json!("catastrophic");
    let err = validate_and_parse(&raw).unwrap_err();
    assert_eq!(err.code(), "invalid_severity");
}

#[test]
fn unknown_event_type_is_invalid_event_type() {
    let mut raw = heartbeat_envelope();
    raw["type"] = json!("machine.exploded");
    let err = validate_and_parse(&raw).unwrap_err();
    assert_eq!(err.code(), "invalid_event_type");
}

#[test]
fn missing_machine_id_field_is_missing_machine_id() {
    let mut raw = heartbeat_envelope();
    raw.as_object_mut().unwrap().remove("machineId");
    let err = validate_and_parse(&raw).unwrap_err();
    assert_eq!(err.code(), "missing_machine_id");
}

#[test]
fn wrong_version_is_invalid_schema_version() {
    let mut raw = heartbeat_envelope();
    raw["version"] = json!("telemetry.v2");
    let err = validate_and_parse(&raw).unwrap_err();
    assert_eq!(err.code(), "invalid_schema_version");
}

#[test]
fn non_object_envelope_is_invalid_envelope() {
    let err = validate_and_parse(&json!("not an object")).unwrap_err();
    assert_eq!(err.code(), "invalid_envelope");
}

#[test]
fn heartbeat_missing_resource_fields_is_invalid_payload() {
    let mut raw = heartbeat_envelope();
    raw["payload"] = json!({ "resource": { "cpuPct": 1.0 } });
    let err = validate_and_parse(&raw).unwrap_err();
    assert_eq!(err.code(), "invalid_payload");
}
