// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chrono::Utc;
use patze_core::{CommandIntent, CommandSnapshot};

use super::*;

fn sample() -> BridgeCommand {
    BridgeCommand::new(
        Utc::now(),
        CommandSnapshot {
            target_id: "t1".into(),
            machine_id: "m1".into(),
            target_version: "v1".into(),
            intent: CommandIntent::RunCommand { line: "echo hi".into(), cwd: None },
            created_by: "tester".into(),
            idempotency_key: "k1".into(),
            approval_required: false,
            policy_version: None,
        },
    )
}

#[test]
fn load_on_missing_file_returns_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = CommandStore::new(dir.path().join("commands.json"));
    assert!(store.load().is_empty());
}

#[test]
fn save_then_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let store = CommandStore::new(dir.path().join("commands.json"));
    let cmd = sample();
    store.save(&[cmd.clone()]).unwrap();
    let loaded = store.load();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].id, cmd.id);
}
