// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Folds validated telemetry into the machine/session/run read models (§4.3).
//!
//! `ProjectorState` is the single-writer map trio; callers fold events into
//! it one at a time via [`ProjectorState::apply`]. The `ReduceCtx` type lives
//! here too since both the projector and the reducer in `reducer.rs` need the
//! same "what time is it, what's the ghost window" context passed in rather
//! than read from a clock internally (§8.1 determinism).

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use patze_core::{
    AgentId, Envelope, EventType, LifecycleState, Machine, MachineKind, MachineStatus, ModelUsage,
    Run, RunDetail, RunId, Session, SessionId, ToolCall,
};

/// Explicit time/window context threaded into the projector and reducer
/// instead of read from a system clock, so folding is reproducible (§8.1).
#[derive(Debug, Clone, Copy)]
pub struct ReduceCtx {
    pub now: DateTime<Utc>,
    pub ghost_window: Duration,
}

impl ReduceCtx {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now, ghost_window: Duration::seconds(patze_core::frontend_snapshot::GHOST_WINDOW_SECS) }
    }
}

fn str_field<'a>(payload: &'a Value, field: &str) -> Option<&'a str> {
    payload.get(field).and_then(Value::as_str)
}

fn parse_machine_status(raw: Option<&str>, fallback: MachineStatus) -> MachineStatus {
    match raw {
        Some("online") => MachineStatus::Online,
        Some("degraded") => MachineStatus::Degraded,
        Some("offline") => MachineStatus::Offline,
        _ => fallback,
    }
}

fn parse_machine_kind(raw: Option<&str>, fallback: MachineKind) -> MachineKind {
    match raw {
        Some("vps") => MachineKind::Vps,
        Some("local") => MachineKind::Local,
        _ => fallback,
    }
}

fn parse_lifecycle_state(raw: &str) -> Option<LifecycleState> {
    match raw {
        "created" => Some(LifecycleState::Created),
        "queued" => Some(LifecycleState::Queued),
        "running" => Some(LifecycleState::Running),
        "waiting_tool" => Some(LifecycleState::WaitingTool),
        "streaming" => Some(LifecycleState::Streaming),
        "completed" => Some(LifecycleState::Completed),
        "failed" => Some(LifecycleState::Failed),
        "cancelled" => Some(LifecycleState::Cancelled),
        _ => None,
    }
}

/// The three server-side read-model maps plus bounded run detail (§3.2),
/// folded in event order. Single-writer; consumers only ever see the
/// frontend reducer's derived snapshot, never this state directly (§5).
#[derive(Debug, Clone, Default)]
pub struct ProjectorState {
    pub machines: HashMap<String, Machine>,
    pub sessions: HashMap<String, Session>,
    pub runs: HashMap<String, Run>,
    pub run_details: HashMap<String, RunDetail>,
}

impl ProjectorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one validated event into the read models.
    pub fn apply(&mut self, event: &Envelope) {
        match event.event_type {
            EventType::MachineRegistered => self.apply_machine_registered(event),
            EventType::MachineHeartbeat => self.apply_machine_heartbeat(event),
            EventType::SessionStateChanged => self.apply_session_state_changed(event),
            EventType::RunStateChanged => self.apply_run_state_changed(event),
            EventType::RunToolStarted => self.apply_run_tool_started(event),
            EventType::RunToolCompleted => self.apply_run_tool_completed(event),
            EventType::RunModelUsage => self.apply_run_model_usage(event),
            EventType::AgentStateChanged
            | EventType::RunLogEmitted
            | EventType::RunResourceUsage
            | EventType::TraceSpanRecorded => {
                // Carried straight through to the frontend reducer's logs
                // and recentEvents; no server-side read-model mutation.
            }
        }
    }

    fn apply_machine_registered(&mut self, event: &Envelope) {
        let status = parse_machine_status(str_field(&event.payload, "status"), MachineStatus::Online);
        let kind = parse_machine_kind(str_field(&event.payload, "kind"), MachineKind::Local);
        let name = str_field(&event.payload, "name").map(str::to_string);
        self.machines.insert(
            event.machine_id.as_str().to_string(),
            Machine {
                id: event.machine_id.clone(),
                name,
                kind,
                status,
                last_seen_at: event.ts,
                last_event_id: event.id.as_str().to_string(),
                last_resource: None,
            },
        );
    }

    fn apply_machine_heartbeat(&mut self, event: &Envelope) {
        let resource = event.payload.get("resource").and_then(|r| {
            serde_json::from_value::<patze_core::ResourceSnapshot>(r.clone()).ok()
        });
        let status_raw = str_field(&event.payload, "status");

        let entry = self.machines.entry(event.machine_id.as_str().to_string()).or_insert_with(|| Machine {
            id: event.machine_id.clone(),
            name: None,
            kind: MachineKind::Local,
            status: MachineStatus::Online,
            last_seen_at: event.ts,
            last_event_id: event.id.as_str().to_string(),
            last_resource: None,
        });

        entry.status = parse_machine_status(status_raw, entry.status);
        entry.last_seen_at = event.ts;
        entry.last_event_id = event.id.as_str().to_string();
        if resource.is_some() {
            entry.last_resource = resource;
        }
    }

    fn apply_session_state_changed(&mut self, event: &Envelope) {
        let Some(session_id) = str_field(&event.payload, "sessionId") else { return };
        let Some(state_raw) = str_field(&event.payload, "state") else { return };
        let Some(state) = parse_lifecycle_state(state_raw) else { return };
        let agent_id = str_field(&event.payload, "agentId").unwrap_or("");

        let created_at = self.sessions.get(session_id).map(|s| s.created_at).unwrap_or(event.ts);
        let ended_at = if state.is_terminal() {
            Some(self.sessions.get(session_id).and_then(|s| s.ended_at).unwrap_or(event.ts))
        } else {
            None
        };

        self.sessions.insert(
            session_id.to_string(),
            Session {
                id: SessionId::new(session_id),
                machine_id: event.machine_id.clone(),
                agent_id: AgentId::new(agent_id),
                state,
                created_at,
                updated_at: event.ts,
                ended_at,
                last_event_id: event.id.as_str().to_string(),
            },
        );
    }

    fn apply_run_state_changed(&mut self, event: &Envelope) {
        let Some(run_id) = str_field(&event.payload, "runId") else { return };
        let Some(session_id) = str_field(&event.payload, "sessionId") else { return };
        let Some(state_raw) = str_field(&event.payload, "state") else { return };
        let Some(state) = parse_lifecycle_state(state_raw) else { return };
        let agent_id = str_field(&event.payload, "agentId")
            .map(str::to_string)
            .or_else(|| self.runs.get(run_id).map(|r| r.agent_id.as_str().to_string()))
            .unwrap_or_default();

        let created_at = self.runs.get(run_id).map(|r| r.created_at).unwrap_or(event.ts);
        let failure_reason = if state == LifecycleState::Failed {
            str_field(&event.payload, "failureReason").map(str::to_string)
        } else {
            None
        };
        let ended_at = if state.is_terminal() {
            Some(self.runs.get(run_id).and_then(|r| r.ended_at).unwrap_or(event.ts))
        } else {
            None
        };

        self.runs.insert(
            run_id.to_string(),
            Run {
                id: RunId::new(run_id),
                session_id: SessionId::new(session_id),
                machine_id: event.machine_id.clone(),
                agent_id: AgentId::new(agent_id),
                state,
                created_at,
                updated_at: event.ts,
                ended_at,
                failure_reason,
                last_event_id: event.id.as_str().to_string(),
            },
        );
    }

    fn apply_run_tool_started(&mut self, event: &Envelope) {
        let Some(run_id) = str_field(&event.payload, "runId") else { return };
        let Some(tool_call_id) = str_field(&event.payload, "toolCallId") else { return };
        let Some(name) = str_field(&event.payload, "name") else { return };

        let detail = self
            .run_details
            .entry(run_id.to_string())
            .or_insert_with(|| RunDetail::new(RunId::new(run_id)));
        detail.push_tool_call(ToolCall {
            id: tool_call_id.to_string(),
            name: name.to_string(),
            started_at: event.ts,
            completed_at: None,
            result_summary: None,
            error: false,
        });
    }

    fn apply_run_tool_completed(&mut self, event: &Envelope) {
        let Some(run_id) = str_field(&event.payload, "runId") else { return };
        let Some(tool_call_id) = str_field(&event.payload, "toolCallId") else { return };
        let summary = str_field(&event.payload, "resultSummary").map(str::to_string);
        let error = event.payload.get("error").and_then(Value::as_bool).unwrap_or(false);

        if let Some(detail) = self.run_details.get_mut(run_id) {
            detail.complete_tool_call(tool_call_id, event.ts, summary, error);
        }
    }

    fn apply_run_model_usage(&mut self, event: &Envelope) {
        let Some(run_id) = str_field(&event.payload, "runId") else { return };
        let input_tokens = event.payload.get("inputTokens").and_then(Value::as_u64).unwrap_or(0);
        let output_tokens = event.payload.get("outputTokens").and_then(Value::as_u64).unwrap_or(0);
        let estimated_cost_usd = event.payload.get("estimatedCostUsd").and_then(Value::as_f64);

        let detail = self
            .run_details
            .entry(run_id.to_string())
            .or_insert_with(|| RunDetail::new(RunId::new(run_id)));
        detail.record_usage(&ModelUsage { input_tokens, output_tokens, estimated_cost_usd });
    }
}

#[cfg(test)]
#[path = "projector_tests.rs"]
mod tests;
