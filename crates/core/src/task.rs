// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduled tasks and their rollback snapshots (§3.5).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::define_id;

define_id! {
    /// Control-plane-minted scheduled-task identifier.
    pub struct TaskId("tsk-");
}

define_id! {
    /// Control-plane-minted task-snapshot identifier.
    pub struct TaskSnapshotId("tsn-");
}

/// Maximum bounded `runs[]` retained per task.
pub const MAX_TASK_RUNS: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Schedule {
    At { at: DateTime<Utc> },
    Every { interval_ms: u64 },
    Cron { expr: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Enabled,
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskRunOutcome {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRun {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcome: TaskRunOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub id: TaskId,
    pub name: String,
    pub description: String,
    pub schedule: Schedule,
    /// Action invoked on fire; reuses the command intent vocabulary so the
    /// same executor path handles both direct dispatch and scheduled runs.
    pub action: crate::command::CommandIntent,
    pub timeout_ms: u64,
    pub status: TaskStatus,
    pub runs: Vec<TaskRun>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_run_at: Option<DateTime<Utc>>,
}

impl ScheduledTask {
    pub fn push_run(&mut self, run: TaskRun) {
        self.runs.push(run);
        if self.runs.len() > MAX_TASK_RUNS {
            let overflow = self.runs.len() - MAX_TASK_RUNS;
            self.runs.drain(0..overflow);
        }
    }
}

/// Source tag distinguishing automatic snapshots (on create/update/delete)
/// from manual ones (triggered via the API) (§4.11).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotSource {
    Auto,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub id: TaskSnapshotId,
    pub ts: DateTime<Utc>,
    pub source: SnapshotSource,
    pub description: String,
    pub tasks: Vec<ScheduledTask>,
}
