// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{TimeZone, Timelike, Utc};
use patze_core::{CommandIntent, Schedule, TaskId, TaskRun, TaskRunOutcome, TaskStatus};

use super::*;

fn base_task(schedule: Schedule) -> ScheduledTask {
    ScheduledTask {
        id: TaskId::new(),
        name: "n".into(),
        description: "d".into(),
        schedule,
        action: CommandIntent::RunCommand { line: "echo hi".into(), cwd: None },
        timeout_ms: 1_000,
        status: TaskStatus::Enabled,
        runs: Vec::new(),
        created_at: Utc.timestamp_opt(0, 0).unwrap(),
        updated_at: Utc.timestamp_opt(0, 0).unwrap(),
        next_run_at: None,
    }
}

#[test]
fn one_shot_at_schedule_fires_once_then_never_again() {
    let at = Utc.timestamp_opt(100, 0).unwrap();
    let mut task = base_task(Schedule::At { at });
    assert_eq!(schedule_next_run_at(&task, Utc.timestamp_opt(0, 0).unwrap()), Some(at));

    task.runs.push(TaskRun { started_at: at, finished_at: at, outcome: TaskRunOutcome::Succeeded, error: None });
    assert_eq!(schedule_next_run_at(&task, Utc.timestamp_opt(200, 0).unwrap()), None);
}

#[test]
fn every_schedule_advances_past_now() {
    let task = base_task(Schedule::Every { interval_ms: 60_000 });
    let now = Utc.timestamp_opt(150, 0).unwrap();
    let next = schedule_next_run_at(&task, now).unwrap();
    assert!(next > now);
    assert_eq!((next - task.created_at).num_seconds() % 60, 0);
}

#[test]
fn due_tasks_only_returns_enabled_tasks_past_their_next_run() {
    let mut due = base_task(Schedule::Every { interval_ms: 60_000 });
    due.next_run_at = Some(Utc.timestamp_opt(50, 0).unwrap());
    let mut not_yet = base_task(Schedule::Every { interval_ms: 60_000 });
    not_yet.next_run_at = Some(Utc.timestamp_opt(500, 0).unwrap());
    let mut disabled = base_task(Schedule::Every { interval_ms: 60_000 });
    disabled.status = TaskStatus::Disabled;
    disabled.next_run_at = Some(Utc.timestamp_opt(50, 0).unwrap());

    let tasks = vec![due.clone(), not_yet, disabled];
    let result = due_tasks(&tasks, Utc.timestamp_opt(100, 0).unwrap());
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].id, due.id);
}

#[test]
fn cron_every_five_minutes_lands_on_a_multiple_of_five() {
    let task = base_task(Schedule::Cron { expr: "*/5 * * * *".into() });
    let now = Utc.timestamp_opt(0, 0).unwrap();
    let next = schedule_next_run_at(&task, now).unwrap();
    assert_eq!(next.minute() % 5, 0);
    assert!(next > now);
}

#[test]
fn cron_with_unsupported_range_syntax_returns_none() {
    let task = base_task(Schedule::Cron { expr: "0 9-17 * * *".into() });
    assert_eq!(schedule_next_run_at(&task, Utc::now()), None);
}
