// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn write_atomic_creates_file_with_exact_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    write_atomic(&path, b"{\"v\":1}", false).unwrap();
    assert_eq!(fs::read(&path).unwrap(), b"{\"v\":1}");
    assert!(!path.with_extension("json.tmp").exists());
}

#[test]
fn write_atomic_backs_up_previous_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    write_atomic(&path, b"old", false).unwrap();
    write_atomic(&path, b"new", true).unwrap();
    assert_eq!(fs::read(&path).unwrap(), b"new");
    assert_eq!(fs::read(path.with_extension("json.bak")).unwrap(), b"old");
}

#[test]
fn load_json_or_default_tolerates_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.json");
    let v: Vec<i32> = load_json_or_default(&path, Vec::new);
    assert!(v.is_empty());
}

#[test]
fn load_json_or_default_tolerates_corrupt_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corrupt.json");
    fs::write(&path, b"not json").unwrap();
    let v: Vec<i32> = load_json_or_default(&path, Vec::new);
    assert!(v.is_empty());
}
