// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration as StdDuration;

use patze_core::{CommandIntent, FakeClock, ResultStatus};
use tempfile::tempdir;

use super::*;

fn queue(dir: &std::path::Path) -> CommandQueue<FakeClock> {
    let store = CommandStore::new(dir.join("commands.json"));
    CommandQueue::new(store, FakeClock::new())
}

fn snapshot(machine_id: &str, approval_required: bool) -> CommandSnapshot {
    CommandSnapshot {
        target_id: "t1".into(),
        machine_id: MachineId::new(machine_id),
        target_version: "v1".into(),
        intent: CommandIntent::RunCommand { line: "echo hi".into(), cwd: None },
        created_by: "tester".into(),
        idempotency_key: "k1".into(),
        approval_required,
        policy_version: None,
    }
}

fn result(status: ResultStatus) -> CommandResult {
    CommandResult {
        status,
        exit_code: Some(0),
        duration_ms: 10,
        stdout: String::new(),
        stderr: String::new(),
        truncated: false,
        artifact: None,
        duplicate: false,
    }
}

#[test]
fn approval_required_command_is_not_pollable_until_approved() {
    let dir = tempdir().unwrap();
    let q = queue(dir.path());
    let cmd = q.create(snapshot("m1", true)).unwrap();

    assert!(q.poll("m1", 1_000).unwrap().is_none());

    q.approve(cmd.id.as_str(), "t1", "v1", "admin").unwrap();
    let leased = q.poll("m1", 1_000).unwrap().unwrap();
    assert_eq!(leased.id, cmd.id);
    assert_eq!(leased.state, CommandState::Leased);
}

#[test]
fn reject_is_terminal_and_not_pollable() {
    let dir = tempdir().unwrap();
    let q = queue(dir.path());
    let cmd = q.create(snapshot("m1", false)).unwrap();
    q.reject(cmd.id.as_str(), "nope").unwrap();
    assert!(q.poll("m1", 1_000).unwrap().is_none());
}

#[test]
fn lease_exclusivity_only_one_poll_wins() {
    let dir = tempdir().unwrap();
    let q = queue(dir.path());
    q.create(snapshot("m1", false)).unwrap();
    let first = q.poll("m1", 1_000).unwrap();
    let second = q.poll("m1", 1_000).unwrap();
    assert!(first.is_some());
    assert!(second.is_none());
}

#[test]
fn ack_running_increments_execution_attempts_once() {
    let dir = tempdir().unwrap();
    let q = queue(dir.path());
    let cmd = q.create(snapshot("m1", false)).unwrap();
    q.poll("m1", 1_000).unwrap().unwrap();
    let acked = q.ack_running(cmd.id.as_str(), "m1").unwrap().unwrap();
    assert_eq!(acked.state, CommandState::Running);
    assert_eq!(acked.execution_attempts, 1);
    let acked_again = q.ack_running(cmd.id.as_str(), "m1").unwrap().unwrap();
    assert_eq!(acked_again.execution_attempts, 1);
}

#[test]
fn push_result_clears_lease_and_sets_terminal_state() {
    let dir = tempdir().unwrap();
    let q = queue(dir.path());
    let cmd = q.create(snapshot("m1", false)).unwrap();
    q.poll("m1", 1_000).unwrap().unwrap();
    let done = q.push_result(cmd.id.as_str(), "m1", result(ResultStatus::Succeeded)).unwrap().unwrap();
    assert_eq!(done.state, CommandState::Succeeded);
    assert!(done.lease_owner_machine_id.is_none());
}

#[test]
fn lease_expiry_then_dead_letter_after_three_attempts() {
    let dir = tempdir().unwrap();
    let store = CommandStore::new(dir.path().join("commands.json"));
    let clock = FakeClock::new();
    let q = CommandQueue::new(store, clock.clone());
    let cmd = q.create(snapshot("m1", false)).unwrap();

    for _ in 0..3 {
        let leased = q.poll("m1", 1_000).unwrap();
        assert!(leased.is_some());
        clock.advance(StdDuration::from_millis(1_100));
    }

    // The third lease's expiry should dead-letter it (leaseAttempts reaches 3).
    let after = q.poll("m1", 1_000).unwrap();
    assert!(after.is_none());
    let record = q.get(&cmd.id).unwrap();
    assert_eq!(record.state, CommandState::Deadletter);
}

#[test]
fn list_sorts_by_created_at_descending() {
    let dir = tempdir().unwrap();
    let q = queue(dir.path());
    let first = q.create(snapshot("m1", false)).unwrap();
    let second = q.create(snapshot("m1", false)).unwrap();
    let listed = q.list(10);
    assert_eq!(listed[0].id, second.id);
    assert_eq!(listed[1].id, first.id);
}
