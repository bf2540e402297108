// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire shapes for scheduled tasks (§3.5, §4.11a CLI).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::commands::CommandIntentDto;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledTaskDto {
    pub id: String,
    pub name: String,
    pub description: String,
    pub schedule: patze_core::Schedule,
    pub action: CommandIntentDto,
    pub timeout_ms: u64,
    pub status: patze_core::TaskStatus,
    pub runs: Vec<patze_core::TaskRun>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_run_at: Option<DateTime<Utc>>,
}

impl From<&patze_core::ScheduledTask> for ScheduledTaskDto {
    fn from(t: &patze_core::ScheduledTask) -> Self {
        Self {
            id: t.id.as_str().to_string(),
            name: t.name.clone(),
            description: t.description.clone(),
            schedule: t.schedule.clone(),
            action: CommandIntentDto::from(&t.action),
            timeout_ms: t.timeout_ms,
            status: t.status,
            runs: t.runs.clone(),
            created_at: t.created_at,
            updated_at: t.updated_at,
            next_run_at: t.next_run_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSnapshotDto {
    pub id: String,
    pub ts: DateTime<Utc>,
    pub source: patze_core::SnapshotSource,
    pub description: String,
    pub tasks: Vec<ScheduledTaskDto>,
}

impl From<&patze_core::TaskSnapshot> for TaskSnapshotDto {
    fn from(s: &patze_core::TaskSnapshot) -> Self {
        Self {
            id: s.id.as_str().to_string(),
            ts: s.ts,
            source: s.source,
            description: s.description.clone(),
            tasks: s.tasks.iter().map(ScheduledTaskDto::from).collect(),
        }
    }
}
