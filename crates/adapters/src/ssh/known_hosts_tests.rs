// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parses_bracket_and_bare_entries() {
    let entries = parse("example.com ssh-ed25519 AAAABBBB\n[h]:2222 ssh-ed25519 CCCCDDDD\n");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].patterns, vec!["[h]:2222".to_string()]);
}

#[test]
fn comma_separated_hosts_all_match() {
    let entries = parse("a.example.com,b.example.com ssh-ed25519 AAAA\n");
    assert_eq!(matching(&entries, "a.example.com", 22).len(), 1);
    assert_eq!(matching(&entries, "b.example.com", 22).len(), 1);
    assert!(matching(&entries, "c.example.com", 22).is_empty());
}

#[test]
fn bracket_port_required_for_non_default_port() {
    let entries = parse("[h]:2222 ssh-ed25519 AAAA\n");
    assert_eq!(matching(&entries, "h", 2222).len(), 1);
    assert!(matching(&entries, "h", 22).is_empty());
}

#[test]
fn wildcard_pattern_matches() {
    let entries = parse("*.example.com ssh-ed25519 AAAA\n");
    assert_eq!(matching(&entries, "foo.example.com", 22).len(), 1);
    assert!(matching(&entries, "example.com", 22).is_empty());
}

#[test]
fn hashed_host_entries_never_match() {
    let entries = parse("|1|abc123|def456= ssh-ed25519 AAAA\n");
    assert!(matching(&entries, "h", 22).is_empty());
}

#[test]
fn tofu_accepts_unknown_host_when_enabled() {
    let decision = decide(&[], "h", 22, "ssh-ed25519", "AAAA", true);
    assert_eq!(decision, HostKeyDecision::TrustedOnFirstUse { appended: false });
}

#[test]
fn tofu_disabled_rejects_unknown_host() {
    let decision = decide(&[], "h", 22, "ssh-ed25519", "AAAA", false);
    assert_eq!(decision, HostKeyDecision::RejectedNoTofu);
}

/// §8.1 host-key-pinning property: a pinned entry rejects a different key
/// even when `trustOnFirstUse=true`.
#[test]
fn pinned_entry_rejects_different_key_even_with_tofu() {
    let entries = parse("h ssh-ed25519 AAAA\n");
    let decision = decide(&entries, "h", 22, "ssh-ed25519", "ZZZZ", true);
    assert_eq!(decision, HostKeyDecision::RejectedMismatch);
}

#[test]
fn pinned_entry_accepts_matching_key() {
    let entries = parse("h ssh-ed25519 AAAA\n");
    let decision = decide(&entries, "h", 22, "ssh-ed25519", "AAAA", true);
    assert_eq!(decision, HostKeyDecision::Pinned);
}

#[test]
fn append_then_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("known_hosts");
    append(&path, "h", 2222, "ssh-ed25519", "AAAA").unwrap();
    let entries = load(&path).unwrap();
    assert_eq!(matching(&entries, "h", 2222).len(), 1);
}
