// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Run` read model and its bounded detail (§3.2).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::define_string_id;
use crate::session::{AgentId, LifecycleState, SessionId};
use crate::telemetry::MachineId;

define_string_id! {
    /// Opaque run identifier minted upstream by OpenClaw.
    pub struct RunId;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,
    pub session_id: SessionId,
    pub machine_id: MachineId,
    pub agent_id: AgentId,
    pub state: LifecycleState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub last_event_id: String,
}

/// Maximum tool calls retained per run before oldest-`startedAt` eviction.
pub const MAX_TOOL_CALLS_PER_RUN: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_summary: Option<String>,
    #[serde(default)]
    pub error: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_cost_usd: Option<f64>,
}

impl ModelUsage {
    /// Accumulate token counts unconditionally; fold `estimated_cost_usd`
    /// only when the incoming usage event supplies one (§4.3).
    pub fn accumulate(&mut self, incoming: &ModelUsage) {
        self.input_tokens += incoming.input_tokens;
        self.output_tokens += incoming.output_tokens;
        if let Some(cost) = incoming.estimated_cost_usd {
            self.estimated_cost_usd = Some(self.estimated_cost_usd.unwrap_or(0.0) + cost);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunDetail {
    pub run_id: RunId,
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_usage: Option<ModelUsage>,
}

impl RunDetail {
    pub fn new(run_id: RunId) -> Self {
        Self { run_id, tool_calls: Vec::new(), model_usage: None }
    }

    /// Push a tool call, evicting the earliest `startedAt` entry on overflow.
    pub fn push_tool_call(&mut self, call: ToolCall) {
        if self.tool_calls.len() >= MAX_TOOL_CALLS_PER_RUN {
            if let Some((idx, _)) =
                self.tool_calls.iter().enumerate().min_by_key(|(_, c)| c.started_at)
            {
                self.tool_calls.remove(idx);
            }
        }
        self.tool_calls.push(call);
    }

    pub fn complete_tool_call(&mut self, id: &str, completed_at: DateTime<Utc>, summary: Option<String>, error: bool) {
        if let Some(call) = self.tool_calls.iter_mut().find(|c| c.id == id) {
            call.completed_at = Some(completed_at);
            call.result_summary = summary;
            call.error = error;
        }
    }

    pub fn record_usage(&mut self, usage: &ModelUsage) {
        self.model_usage.get_or_insert_with(ModelUsage::default).accumulate(usage);
    }
}
