// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Session` read model (§3.2).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::define_string_id;
use crate::telemetry::MachineId;

define_string_id! {
    /// Opaque session identifier minted upstream by OpenClaw.
    pub struct SessionId;
}

define_string_id! {
    /// Opaque agent identifier minted upstream by OpenClaw.
    pub struct AgentId;
}

/// Lifecycle states shared by sessions and runs (§3.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Created,
    Queued,
    Running,
    WaitingTool,
    Streaming,
    Completed,
    Failed,
    Cancelled,
}

impl LifecycleState {
    /// Terminal states: `{completed, failed, cancelled}`.
    pub fn is_terminal(self) -> bool {
        matches!(self, LifecycleState::Completed | LifecycleState::Failed | LifecycleState::Cancelled)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub machine_id: MachineId,
    pub agent_id: AgentId,
    pub state: LifecycleState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    pub last_event_id: String,
}
