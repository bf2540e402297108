// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire shape for `GET /snapshot` (§4.4, §6.2).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineDto {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub kind: patze_core::MachineKind,
    pub status: patze_core::MachineStatus,
    pub last_seen_at: DateTime<Utc>,
    pub last_event_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_resource: Option<patze_core::ResourceSnapshot>,
}

impl From<&patze_core::Machine> for MachineDto {
    fn from(m: &patze_core::Machine) -> Self {
        Self {
            id: m.id.as_str().to_string(),
            name: m.name.clone(),
            kind: m.kind,
            status: m.status,
            last_seen_at: m.last_seen_at,
            last_event_id: m.last_event_id.clone(),
            last_resource: m.last_resource.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDto {
    pub id: String,
    pub machine_id: String,
    pub agent_id: String,
    pub state: patze_core::LifecycleState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    pub last_event_id: String,
}

impl From<&patze_core::Session> for SessionDto {
    fn from(s: &patze_core::Session) -> Self {
        Self {
            id: s.id.as_str().to_string(),
            machine_id: s.machine_id.as_str().to_string(),
            agent_id: s.agent_id.as_str().to_string(),
            state: s.state,
            created_at: s.created_at,
            updated_at: s.updated_at,
            ended_at: s.ended_at,
            last_event_id: s.last_event_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunDto {
    pub id: String,
    pub session_id: String,
    pub machine_id: String,
    pub agent_id: String,
    pub state: patze_core::LifecycleState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub last_event_id: String,
}

impl From<&patze_core::Run> for RunDto {
    fn from(r: &patze_core::Run) -> Self {
        Self {
            id: r.id.as_str().to_string(),
            session_id: r.session_id.as_str().to_string(),
            machine_id: r.machine_id.as_str().to_string(),
            agent_id: r.agent_id.as_str().to_string(),
            state: r.state,
            created_at: r.created_at,
            updated_at: r.updated_at,
            ended_at: r.ended_at,
            failure_reason: r.failure_reason.clone(),
            last_event_id: r.last_event_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunDetailDto {
    pub run_id: String,
    pub tool_calls: Vec<patze_core::ToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_usage: Option<patze_core::ModelUsage>,
}

impl From<&patze_core::RunDetail> for RunDetailDto {
    fn from(d: &patze_core::RunDetail) -> Self {
        Self {
            run_id: d.run_id.as_str().to_string(),
            tool_calls: d.tool_calls.clone(),
            model_usage: d.model_usage,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineHealthDto {
    pub machine_id: String,
    pub status: patze_core::HealthStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall: Option<patze_core::HealthStatus>,
    pub machines: Vec<MachineHealthDto>,
}

impl From<&patze_core::Health> for HealthDto {
    fn from(h: &patze_core::Health) -> Self {
        Self {
            overall: h.overall,
            machines: h
                .machines
                .iter()
                .map(|m| MachineHealthDto { machine_id: m.machine_id.as_str().to_string(), status: m.status })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntryDto {
    pub machine_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    pub line: String,
    pub ts: DateTime<Utc>,
}

impl From<&patze_core::LogEntry> for LogEntryDto {
    fn from(l: &patze_core::LogEntry) -> Self {
        Self { machine_id: l.machine_id.clone(), run_id: l.run_id.clone(), line: l.line.clone(), ts: l.ts }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentEventDto {
    pub event_id: String,
    pub machine_id: String,
    pub ts: DateTime<Utc>,
    pub summary: String,
}

impl From<&patze_core::RecentEvent> for RecentEventDto {
    fn from(e: &patze_core::RecentEvent) -> Self {
        Self { event_id: e.event_id.clone(), machine_id: e.machine_id.clone(), ts: e.ts, summary: e.summary.clone() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontendSnapshotDto {
    pub machines: Vec<MachineDto>,
    pub sessions: Vec<SessionDto>,
    pub runs: Vec<RunDto>,
    pub active_runs: Vec<RunDto>,
    pub health: HealthDto,
    pub run_details: HashMap<String, RunDetailDto>,
    pub logs: Vec<LogEntryDto>,
    pub recent_events: Vec<RecentEventDto>,
    pub last_updated: DateTime<Utc>,
}

impl From<&patze_core::FrontendSnapshot> for FrontendSnapshotDto {
    fn from(s: &patze_core::FrontendSnapshot) -> Self {
        Self {
            machines: s.machines.iter().map(MachineDto::from).collect(),
            sessions: s.sessions.iter().map(SessionDto::from).collect(),
            runs: s.runs.iter().map(RunDto::from).collect(),
            active_runs: s.active_runs.iter().map(RunDto::from).collect(),
            health: HealthDto::from(&s.health),
            run_details: s.run_details.iter().map(|(k, v)| (k.clone(), RunDetailDto::from(v))).collect(),
            logs: s.logs.iter().map(LogEntryDto::from).collect(),
            recent_events: s.recent_events.iter().map(RecentEventDto::from).collect(),
            last_updated: s.last_updated,
        }
    }
}
