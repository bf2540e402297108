// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chrono::Utc;
use patze_core::{CommandIntent, Schedule, ScheduledTask, TaskId, TaskRun, TaskRunOutcome, TaskStatus};

use super::*;

fn sample_task() -> ScheduledTask {
    let now = Utc::now();
    ScheduledTask {
        id: TaskId::new(),
        name: "nightly-sync".into(),
        description: "syncs the thing".into(),
        schedule: Schedule::Every { interval_ms: 60_000 },
        action: CommandIntent::TriggerJob { job_name: "sync".into(), args: Default::default() },
        timeout_ms: 5_000,
        status: TaskStatus::Enabled,
        runs: Vec::new(),
        created_at: now,
        updated_at: now,
        next_run_at: None,
    }
}

#[test]
fn load_on_missing_file_returns_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = TaskStore::new(dir.path().join("tasks.json"), dir.path().join("runs.jsonl"));
    assert!(store.load().is_empty());
}

#[test]
fn save_then_load_round_trips_and_writes_backup_on_second_save() {
    let dir = tempfile::tempdir().unwrap();
    let store = TaskStore::new(dir.path().join("tasks.json"), dir.path().join("runs.jsonl"));
    let task = sample_task();
    store.save(&[task.clone()]).unwrap();
    store.save(&[task.clone()]).unwrap();
    assert!(dir.path().join("tasks.json.bak").exists());
    let loaded = store.load();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].id, task.id);
}

#[test]
fn append_run_history_writes_one_jsonl_line_per_run() {
    let dir = tempfile::tempdir().unwrap();
    let store = TaskStore::new(dir.path().join("tasks.json"), dir.path().join("runs.jsonl"));
    let record = RunHistoryRecord {
        task_id: "tsk-abc".into(),
        run: TaskRun { started_at: Utc::now(), finished_at: Utc::now(), outcome: TaskRunOutcome::Succeeded, error: None },
    };
    store.append_run_history(&record).unwrap();
    store.append_run_history(&record).unwrap();
    let content = std::fs::read_to_string(dir.path().join("runs.jsonl")).unwrap();
    assert_eq!(content.lines().count(), 2);
}
