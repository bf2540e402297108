// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Bridge Command record and its lease state machine's data shape
//! (§3.4). The state *transitions* live in `patze-engine`; this module owns
//! the shape and the terminal/pollable predicates everyone agrees on.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::define_id;
use crate::telemetry::MachineId;

define_id! {
    /// Control-plane-minted command identifier.
    pub struct CommandId("cmd-");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandState {
    Queued,
    Leased,
    Running,
    Succeeded,
    Failed,
    Rejected,
    Expired,
    Deadletter,
}

impl CommandState {
    /// Terminal: `{succeeded, failed, rejected, deadletter}`.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CommandState::Succeeded
                | CommandState::Failed
                | CommandState::Rejected
                | CommandState::Deadletter
        )
    }

    /// Eligible for `poll` (queued or expired, and not terminal).
    pub fn is_pollable(self) -> bool {
        matches!(self, CommandState::Queued | CommandState::Expired)
    }
}

/// What the command asks the target to do. `original_source/` shows these
/// carry intent-specific fields rather than an untyped args bag, so the
/// queue and dead-letter logic can reason about idempotency uniformly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum CommandIntent {
    TriggerJob { job_name: String, args: HashMap<String, String> },
    AgentSetEnabled { agent_id: String, enabled: bool },
    ApproveRequest { request_id: String },
    RunCommand { line: String, #[serde(default)] cwd: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandSnapshot {
    pub target_id: String,
    pub machine_id: MachineId,
    pub target_version: String,
    #[serde(flatten)]
    pub intent: CommandIntent,
    pub created_by: String,
    pub idempotency_key: String,
    pub approval_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_version: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    pub status: ResultStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
    pub stdout: String,
    pub stderr: String,
    #[serde(default)]
    pub truncated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
    #[serde(default)]
    pub duplicate: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeCommand {
    pub id: CommandId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub state: CommandState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lease_owner_machine_id: Option<MachineId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lease_until: Option<DateTime<Utc>>,
    pub lease_attempts: u32,
    pub execution_attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<CommandResult>,
    pub snapshot: CommandSnapshot,
}

impl BridgeCommand {
    pub fn new(now: DateTime<Utc>, snapshot: CommandSnapshot) -> Self {
        Self {
            id: CommandId::new(),
            created_at: now,
            updated_at: now,
            state: CommandState::Queued,
            lease_owner_machine_id: None,
            lease_until: None,
            lease_attempts: 0,
            execution_attempts: 0,
            approved_at: None,
            approved_by: None,
            rejected_reason: None,
            result: None,
            snapshot,
        }
    }

    /// Ready to be handed out by `poll`: pollable state, machine match, and
    /// (if required) already approved.
    pub fn is_pollable_for(&self, machine_id: &str) -> bool {
        self.state.is_pollable()
            && self.snapshot.machine_id.as_str() == machine_id
            && (!self.snapshot.approval_required || self.approved_at.is_some())
    }
}
