// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire shapes for the Bridge Command Queue (§3.4, §4.9, §6.3).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum CommandIntentDto {
    TriggerJob {
        #[serde(rename = "jobName")]
        job_name: String,
        args: HashMap<String, String>,
    },
    AgentSetEnabled {
        #[serde(rename = "agentId")]
        agent_id: String,
        enabled: bool,
    },
    ApproveRequest {
        #[serde(rename = "requestId")]
        request_id: String,
    },
    RunCommand {
        line: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cwd: Option<String>,
    },
}

impl From<&patze_core::CommandIntent> for CommandIntentDto {
    fn from(i: &patze_core::CommandIntent) -> Self {
        match i {
            patze_core::CommandIntent::TriggerJob { job_name, args } => {
                CommandIntentDto::TriggerJob { job_name: job_name.clone(), args: args.clone() }
            }
            patze_core::CommandIntent::AgentSetEnabled { agent_id, enabled } => {
                CommandIntentDto::AgentSetEnabled { agent_id: agent_id.clone(), enabled: *enabled }
            }
            patze_core::CommandIntent::ApproveRequest { request_id } => {
                CommandIntentDto::ApproveRequest { request_id: request_id.clone() }
            }
            patze_core::CommandIntent::RunCommand { line, cwd } => {
                CommandIntentDto::RunCommand { line: line.clone(), cwd: cwd.clone() }
            }
        }
    }
}

impl From<CommandIntentDto> for patze_core::CommandIntent {
    fn from(i: CommandIntentDto) -> Self {
        match i {
            CommandIntentDto::TriggerJob { job_name, args } => {
                patze_core::CommandIntent::TriggerJob { job_name, args }
            }
            CommandIntentDto::AgentSetEnabled { agent_id, enabled } => {
                patze_core::CommandIntent::AgentSetEnabled { agent_id, enabled }
            }
            CommandIntentDto::ApproveRequest { request_id } => {
                patze_core::CommandIntent::ApproveRequest { request_id }
            }
            CommandIntentDto::RunCommand { line, cwd } => patze_core::CommandIntent::RunCommand { line, cwd },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandSnapshotDto {
    pub target_id: String,
    pub machine_id: String,
    pub target_version: String,
    #[serde(flatten)]
    pub intent: CommandIntentDto,
    pub created_by: String,
    pub idempotency_key: String,
    pub approval_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_version: Option<String>,
}

impl From<&patze_core::CommandSnapshot> for CommandSnapshotDto {
    fn from(s: &patze_core::CommandSnapshot) -> Self {
        Self {
            target_id: s.target_id.clone(),
            machine_id: s.machine_id.as_str().to_string(),
            target_version: s.target_version.clone(),
            intent: CommandIntentDto::from(&s.intent),
            created_by: s.created_by.clone(),
            idempotency_key: s.idempotency_key.clone(),
            approval_required: s.approval_required,
            policy_version: s.policy_version.clone(),
        }
    }
}

/// Request body for creating a new bridge command (§4.9 `create`).
pub type CreateCommandRequest = CommandSnapshotDto;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResultDto {
    pub status: patze_core::ResultStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
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

impl From<&patze_core::CommandResult> for CommandResultDto {
    fn from(r: &patze_core::CommandResult) -> Self {
        Self {
            status: r.status,
            exit_code: r.exit_code,
            duration_ms: r.duration_ms,
            stdout: r.stdout.clone(),
            stderr: r.stderr.clone(),
            truncated: r.truncated,
            artifact: r.artifact.clone(),
            duplicate: r.duplicate,
        }
    }
}

impl From<CommandResultDto> for patze_core::CommandResult {
    fn from(r: CommandResultDto) -> Self {
        patze_core::CommandResult {
            status: r.status,
            exit_code: r.exit_code,
            duration_ms: r.duration_ms,
            stdout: r.stdout,
            stderr: r.stderr,
            truncated: r.truncated,
            artifact: r.artifact,
            duplicate: r.duplicate,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeCommandDto {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub state: patze_core::CommandState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lease_owner_machine_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lease_until: Option<DateTime<Utc>>,
    pub lease_attempts: u32,
    pub execution_attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<CommandResultDto>,
    pub snapshot: CommandSnapshotDto,
}

impl From<&patze_core::BridgeCommand> for BridgeCommandDto {
    fn from(c: &patze_core::BridgeCommand) -> Self {
        Self {
            id: c.id.as_str().to_string(),
            created_at: c.created_at,
            updated_at: c.updated_at,
            state: c.state,
            lease_owner_machine_id: c.lease_owner_machine_id.as_ref().map(|m| m.as_str().to_string()),
            lease_until: c.lease_until,
            lease_attempts: c.lease_attempts,
            execution_attempts: c.execution_attempts,
            approved_at: c.approved_at,
            approved_by: c.approved_by.clone(),
            rejected_reason: c.rejected_reason.clone(),
            result: c.result.as_ref().map(CommandResultDto::from),
            snapshot: CommandSnapshotDto::from(&c.snapshot),
        }
    }
}
