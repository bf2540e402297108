// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{TimeZone, Utc};
use patze_core::{EventId, HealthStatus, MachineId, Severity, TraceContext};
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

fn ctx_at(ts: i64) -> ReduceCtx {
    ReduceCtx::new(Utc.timestamp_opt(ts, 0).unwrap())
}

/// §8.3 scenario 1: heartbeat + run lifecycle.
#[test]
fn heartbeat_and_run_lifecycle_scenario() {
    let mut projector = ProjectorState::new();
    let mut snapshot = FrontendSnapshot::empty(Utc.timestamp_opt(0, 0).unwrap());

    let e0 = envelope("e0", EventType::MachineRegistered, "m1", 0, json!({ "status": "online" }));
    projector.apply(&e0);
    snapshot = reduce(&snapshot, &projector, &e0, &ctx_at(0));

    let e1 = envelope(
        "e1",
        EventType::RunStateChanged,
        "m1",
        1,
        json!({ "runId": "r1", "sessionId": "s1", "state": "running" }),
    );
    projector.apply(&e1);
    snapshot = reduce(&snapshot, &projector, &e1, &ctx_at(1));

    let e2 = envelope(
        "e2",
        EventType::RunStateChanged,
        "m1",
        2,
        json!({ "runId": "r1", "sessionId": "s1", "state": "completed" }),
    );
    projector.apply(&e2);
    snapshot = reduce(&snapshot, &projector, &e2, &ctx_at(2));

    assert_eq!(snapshot.machines.len(), 1);
    assert_eq!(snapshot.runs.len(), 1);
    assert_eq!(snapshot.runs[0].state, patze_core::LifecycleState::Completed);
    assert!(snapshot.runs[0].ended_at.is_some());
    assert!(snapshot.active_runs.is_empty());
    assert_eq!(snapshot.health.overall, Some(HealthStatus::Healthy));
    assert!(!snapshot.recent_events.iter().any(|e| e.summary.contains("heartbeat")));
}

#[test]
fn heartbeats_are_excluded_from_recent_events() {
    let mut projector = ProjectorState::new();
    let snapshot = FrontendSnapshot::empty(Utc.timestamp_opt(0, 0).unwrap());
    let e = envelope(
        "e1",
        EventType::MachineHeartbeat,
        "m1",
        10,
        json!({ "resource": { "cpuPct": 1.0, "memoryBytes": 1, "memoryPct": 1.0 } }),
    );
    projector.apply(&e);
    let next = reduce(&snapshot, &projector, &e, &ctx_at(10));
    assert!(next.recent_events.is_empty());
}

#[test]
fn ghost_machine_is_pruned_from_snapshot() {
    let mut projector = ProjectorState::new();
    let snapshot = FrontendSnapshot::empty(Utc.timestamp_opt(0, 0).unwrap());
    let e = envelope("e1", EventType::MachineHeartbeat, "m1", 0, json!({ "resource": { "cpuPct": 1.0, "memoryBytes": 1, "memoryPct": 1.0 } }));
    projector.apply(&e);

    // No name, stale by 3 minutes, and never referenced by a session/run.
    let ctx = ctx_at(180);
    let next = reduce(&snapshot, &projector, &e, &ctx);
    assert!(next.machines.is_empty());
}

#[test]
fn last_updated_tracks_max_event_timestamp() {
    let mut projector = ProjectorState::new();
    let mut snapshot = FrontendSnapshot::empty(Utc.timestamp_opt(5, 0).unwrap());
    let e = envelope("e1", EventType::MachineRegistered, "m1", 1, json!({ "status": "online" }));
    projector.apply(&e);
    snapshot = reduce(&snapshot, &projector, &e, &ctx_at(1));
    assert_eq!(snapshot.last_updated, Utc.timestamp_opt(5, 0).unwrap());
}
