// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{TimeZone, Utc};
use patze_core::{EventId, MachineId, Severity, TraceContext};
use serde_json::json;

use super::*;

fn envelope(id: &str, event_type: EventType, machine_id: &str, ts: i64, payload: Value) -> Envelope {
    Envelope {
        version: "telemetry.v1".into(),
        id: EventId::new(id),
        ts: Utc.timestamp_opt(ts, 0).unwrap(),
        machine_id: MachineId::new(machine_id),
        severity: Severity::Info,
        event_type,
        payload,
        trace: TraceContext { trace_id: "t1".into(), span_id: None, parent_span_id: None },
    }
}

#[test]
fn machine_registered_then_heartbeat_updates_in_place() {
    let mut state = ProjectorState::new();
    state.apply(&envelope(
        "e1",
        EventType::MachineRegistered,
        "m1",
        100,
        json!({ "status": "online", "kind": "vps" }),
    ));
    state.apply(&envelope(
        "e2",
        EventType::MachineHeartbeat,
        "m1",
        200,
        json!({ "resource": { "cpuPct": 10.0, "memoryBytes": 1024, "memoryPct": 5.0 } }),
    ));

    let machine = state.machines.get("m1").unwrap();
    assert_eq!(machine.kind, MachineKind::Vps);
    assert_eq!(machine.status, MachineStatus::Online);
    assert_eq!(machine.last_seen_at, Utc.timestamp_opt(200, 0).unwrap());
    assert!(machine.last_resource.is_some());
}

#[test]
fn session_created_at_is_preserved_across_updates() {
    let mut state = ProjectorState::new();
    state.apply(&envelope(
        "e1",
        EventType::SessionStateChanged,
        "m1",
        100,
        json!({ "sessionId": "s1", "agentId": "a1", "state": "created" }),
    ));
    state.apply(&envelope(
        "e2",
        EventType::SessionStateChanged,
        "m1",
        200,
        json!({ "sessionId": "s1", "state": "completed" }),
    ));

    let session = state.sessions.get("s1").unwrap();
    assert_eq!(session.created_at, Utc.timestamp_opt(100, 0).unwrap());
    assert_eq!(session.ended_at, Some(Utc.timestamp_opt(200, 0).unwrap()));
}

#[test]
fn run_failure_reason_only_set_when_state_is_failed() {
    let mut state = ProjectorState::new();
    state.apply(&envelope(
        "e1",
        EventType::RunStateChanged,
        "m1",
        100,
        json!({ "runId": "r1", "sessionId": "s1", "state": "running" }),
    ));
    state.apply(&envelope(
        "e2",
        EventType::RunStateChanged,
        "m1",
        200,
        json!({ "runId": "r1", "sessionId": "s1", "state": "failed", "failureReason": "boom" }),
    ));

    let run = state.runs.get("r1").unwrap();
    assert_eq!(run.failure_reason.as_deref(), Some("boom"));
    assert!(run.ended_at.is_some());
}

#[test]
fn tool_call_lifecycle_and_model_usage_accumulate() {
    let mut state = ProjectorState::new();
    state.apply(&envelope(
        "e1",
        EventType::RunToolStarted,
        "m1",
        100,
        json!({ "runId": "r1", "toolCallId": "tc1", "name": "grep" }),
    ));
    state.apply(&envelope(
        "e2",
        EventType::RunToolCompleted,
        "m1",
        110,
        json!({ "runId": "r1", "toolCallId": "tc1", "resultSummary": "ok" }),
    ));
    state.apply(&envelope(
        "e3",
        EventType::RunModelUsage,
        "m1",
        120,
        json!({ "runId": "r1", "provider": "anthropic", "model": "x", "inputTokens": 10, "outputTokens": 5 }),
    ));
    state.apply(&envelope(
        "e4",
        EventType::RunModelUsage,
        "m1",
        130,
        json!({ "runId": "r1", "provider": "anthropic", "model": "x", "inputTokens": 3, "outputTokens": 1, "estimatedCostUsd": 0.02 }),
    ));

    let detail = state.run_details.get("r1").unwrap();
    assert_eq!(detail.tool_calls.len(), 1);
    assert_eq!(detail.tool_calls[0].result_summary.as_deref(), Some("ok"));
    let usage = detail.model_usage.as_ref().unwrap();
    assert_eq!(usage.input_tokens, 13);
    assert_eq!(usage.output_tokens, 6);
    assert_eq!(usage.estimated_cost_usd, Some(0.02));
}
