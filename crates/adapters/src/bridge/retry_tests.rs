// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn matches_each_vocabulary_term_case_insensitively() {
    assert!(is_transient("Connection TIMED OUT"));
    assert!(is_transient("ECONNRESET by peer"));
    assert!(is_transient("getaddrinfo ENOTFOUND example.com"));
    assert!(is_transient("SSH connection closed by remote host"));
    assert!(is_transient("sftp: no such file"));
}

#[test]
fn non_transient_message_does_not_match() {
    assert!(!is_transient("permission denied (publickey)"));
}

#[test]
fn backoff_doubles_and_caps_at_sixty_seconds() {
    assert_eq!(backoff_for_attempt(1), Some(Duration::from_secs(4)));
    assert_eq!(backoff_for_attempt(2), Some(Duration::from_secs(8)));
    assert_eq!(backoff_for_attempt(3), Some(Duration::from_secs(16)));
    assert_eq!(backoff_for_attempt(4), Some(Duration::from_secs(32)));
    assert_eq!(backoff_for_attempt(5), Some(Duration::from_secs(60)));
    assert_eq!(backoff_for_attempt(6), Some(Duration::from_secs(60)));
}

#[test]
fn backoff_exhausts_after_max_attempts() {
    assert_eq!(backoff_for_attempt(7), None);
}
