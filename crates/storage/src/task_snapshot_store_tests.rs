// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chrono::Utc;
use patze_core::{SnapshotSource, TaskSnapshotId};

use super::*;

fn sample(ts: chrono::DateTime<Utc>) -> TaskSnapshot {
    TaskSnapshot { id: TaskSnapshotId::new(), ts, source: SnapshotSource::Auto, description: "on create".into(), tasks: Vec::new() }
}

#[test]
fn save_then_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let store = TaskSnapshotStore::new(dir.path());
    let snap = sample(Utc::now());
    store.save(&snap).unwrap();
    let loaded = store.load(snap.id.as_str()).unwrap().unwrap();
    assert_eq!(loaded.id, snap.id);
}

#[test]
fn load_missing_returns_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = TaskSnapshotStore::new(dir.path());
    assert!(store.load("tsn-nope").unwrap().is_none());
}

#[test]
fn list_sorts_most_recent_first() {
    let dir = tempfile::tempdir().unwrap();
    let store = TaskSnapshotStore::new(dir.path());
    let older = sample(Utc::now() - chrono::Duration::hours(1));
    let newer = sample(Utc::now());
    store.save(&older).unwrap();
    store.save(&newer).unwrap();
    let listed = store.list().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, newer.id);
}
