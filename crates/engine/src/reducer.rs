// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The frontend unified snapshot reducer (§4.3/§3.3).
//!
//! `reduce` is a pure function of `(prev, projector, event, ctx)`: given the
//! same inputs it always returns the same output, with no internal clock or
//! randomness (§8.1's determinism property). Rather than incrementally patch
//! `prev`, every call rebuilds the derived fields (`machines`, `activeRuns`,
//! `health`) from the projector's read models, which are themselves already
//! folded incrementally — simpler to reason about than threading per-field
//! diffs, at the cost of one extra pass per event.

use patze_core::{
    Envelope, EventType, FrontendSnapshot, Health, LogEntry, Machine, RecentEvent,
};
use serde_json::Value;

use crate::projector::{ProjectorState, ReduceCtx};

fn str_field<'a>(payload: &'a Value, field: &str) -> Option<&'a str> {
    payload.get(field).and_then(Value::as_str)
}

/// Fixed per-event-type one-line summary (§4.3). `prev` supplies the "from"
/// half of transition summaries since the projector has already overwritten
/// its own copy of the prior state by the time this runs.
fn summarize(event: &Envelope, prev: &FrontendSnapshot) -> Option<String> {
    match event.event_type {
        EventType::MachineHeartbeat => None,
        EventType::MachineRegistered => {
            let status = str_field(&event.payload, "status").unwrap_or("unknown");
            Some(format!("machine registered: {status}"))
        }
        EventType::AgentStateChanged => {
            let agent = str_field(&event.payload, "agentId").unwrap_or("?");
            let state = str_field(&event.payload, "state").unwrap_or("?");
            Some(format!("agent {agent}: {state}"))
        }
        EventType::SessionStateChanged => {
            let session_id = str_field(&event.payload, "sessionId").unwrap_or("?");
            let to = str_field(&event.payload, "state").unwrap_or("?");
            let from = prev
                .sessions
                .iter()
                .find(|s| s.id.as_str() == session_id)
                .map(|s| format!("{:?}", s.state))
                .unwrap_or_else(|| "new".to_string());
            Some(format!("session {session_id}: {from} → {to}"))
        }
        EventType::RunStateChanged => {
            let run_id = str_field(&event.payload, "runId").unwrap_or("?");
            let to = str_field(&event.payload, "state").unwrap_or("?");
            let from = prev
                .runs
                .iter()
                .find(|r| r.id.as_str() == run_id)
                .map(|r| format!("{:?}", r.state))
                .unwrap_or_else(|| "new".to_string());
            Some(format!("run {run_id}: {from} → {to}"))
        }
        EventType::RunLogEmitted => {
            let line = str_field(&event.payload, "line").unwrap_or("");
            Some(format!("log: {line}"))
        }
        EventType::RunToolStarted => {
            let name = str_field(&event.payload, "name").unwrap_or("?");
            Some(format!("tool started: {name}"))
        }
        EventType::RunToolCompleted => {
            let tool_call_id = str_field(&event.payload, "toolCallId").unwrap_or("?");
            Some(format!("tool completed: {tool_call_id}"))
        }
        EventType::RunModelUsage => {
            let input = event.payload.get("inputTokens").and_then(Value::as_u64).unwrap_or(0);
            let output = event.payload.get("outputTokens").and_then(Value::as_u64).unwrap_or(0);
            Some(format!("model usage: {input}+{output} tokens"))
        }
        EventType::RunResourceUsage => Some("resource usage reported".to_string()),
        EventType::TraceSpanRecorded => {
            let name = str_field(&event.payload, "name").unwrap_or("?");
            Some(format!("trace span: {name}"))
        }
    }
}

fn is_referenced_recently(machine_id: &str, projector: &ProjectorState, ctx: &ReduceCtx) -> bool {
    let within_window = |updated_at: chrono::DateTime<chrono::Utc>| ctx.now - updated_at <= ctx.ghost_window;
    projector.sessions.values().any(|s| s.machine_id.as_str() == machine_id && within_window(s.updated_at))
        || projector.runs.values().any(|r| r.machine_id.as_str() == machine_id && within_window(r.updated_at))
}

fn visible_machines(projector: &ProjectorState, ctx: &ReduceCtx) -> Vec<Machine> {
    projector
        .machines
        .values()
        .filter(|m| !m.is_ghost(ctx.now, ctx.ghost_window, is_referenced_recently(m.id.as_str(), projector, ctx)))
        .cloned()
        .collect()
}

/// Rebuild the frontend snapshot after folding `event` into `projector`.
/// `projector` must already reflect `event` (the caller applies it first);
/// `prev` is the snapshot produced by the previous call, used only to read
/// the "from" half of state-transition summaries and to carry forward
/// `logs`/`recentEvents`.
pub fn reduce(prev: &FrontendSnapshot, projector: &ProjectorState, event: &Envelope, ctx: &ReduceCtx) -> FrontendSnapshot {
    let machines = visible_machines(projector, ctx);
    let mut runs: Vec<_> = projector.runs.values().cloned().collect();
    let sessions: Vec<_> = projector.sessions.values().cloned().collect();
    let active_runs: Vec<_> = runs.iter().filter(|r| !r.state.is_terminal()).cloned().collect();
    let any_run_failed = runs.iter().any(|r| r.state == patze_core::LifecycleState::Failed);
    let health = Health::recompute(&machines, any_run_failed);

    let mut next = FrontendSnapshot {
        machines,
        sessions,
        runs: std::mem::take(&mut runs),
        active_runs,
        health,
        run_details: projector.run_details.clone(),
        logs: prev.logs.clone(),
        recent_events: prev.recent_events.clone(),
        last_updated: prev.last_updated.max(event.ts),
    };

    if event.event_type == EventType::RunLogEmitted {
        let line = str_field(&event.payload, "line").unwrap_or("").to_string();
        let run_id = str_field(&event.payload, "runId").map(str::to_string);
        next.push_log(LogEntry { machine_id: event.machine_id.as_str().to_string(), run_id, line, ts: event.ts });
    }

    if !event.event_type.is_heartbeat() {
        if let Some(summary) = summarize(event, prev) {
            next.push_recent_event(RecentEvent {
                event_id: event.id.as_str().to_string(),
                machine_id: event.machine_id.as_str().to_string(),
                ts: event.ts,
                summary,
            });
        }
    }

    next.sort_all();
    next
}

#[cfg(test)]
#[path = "reducer_tests.rs"]
mod tests;
