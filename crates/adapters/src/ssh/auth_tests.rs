// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const CONFIG: &str = "\
Host staging
    HostName 10.0.0.5
    User deploy
    Port 2222
    IdentityFile ~/.ssh/staging_key

Host prod
    HostName 10.0.0.9
";

#[test]
fn resolves_matching_alias_block() {
    let target = resolve_ssh_alias(CONFIG, "staging").unwrap();
    assert_eq!(target.host, "10.0.0.5");
    assert_eq!(target.user, "deploy");
    assert_eq!(target.port, 2222);
    assert!(target.identity_file.is_some());
}

#[test]
fn unknown_alias_resolves_to_none() {
    assert!(resolve_ssh_alias(CONFIG, "nope").is_none());
}

#[test]
fn block_without_explicit_port_defaults_to_22() {
    let target = resolve_ssh_alias(CONFIG, "prod").unwrap();
    assert_eq!(target.port, 22);
}

#[test]
fn key_outside_ssh_dir_is_rejected() {
    let err = enforce_key_under_ssh_dir(std::path::Path::new("/etc/passwd"));
    assert!(err.is_err());
}
