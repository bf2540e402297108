// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn facts(system: bool, user: bool, root: bool, sudo_cached: bool, sudo_present: bool) -> RemoteFacts {
    RemoteFacts {
        system_unit_active: system,
        user_unit_active: user,
        is_root: root,
        sudo_cached,
        sudo_present,
    }
}

#[test]
fn active_system_unit_takes_priority() {
    let f = facts(true, true, false, false, false);
    assert_eq!(decide_install_action(&f), InstallAction::SystemModeUpdate);
}

#[test]
fn active_user_unit_is_next_priority() {
    let f = facts(false, true, false, false, false);
    assert_eq!(decide_install_action(&f), InstallAction::UserModeUpdate);
}

#[test]
fn root_with_no_active_service_gets_fresh_system_install() {
    let f = facts(false, false, true, false, false);
    assert_eq!(decide_install_action(&f), InstallAction::FreshSystemInstall);
}

#[test]
fn cached_sudo_gets_fresh_system_install() {
    let f = facts(false, false, false, true, false);
    assert_eq!(decide_install_action(&f), InstallAction::FreshSystemInstall);
}

#[test]
fn sudo_present_but_uncached_needs_password() {
    let f = facts(false, false, false, false, true);
    assert_eq!(decide_install_action(&f), InstallAction::NeedsSudoPassword);
}

#[test]
fn no_privilege_at_all_falls_back_to_user_install() {
    let f = facts(false, false, false, false, false);
    assert_eq!(decide_install_action(&f), InstallAction::FreshUserInstall);
}

#[test]
fn parses_sha256sum_output() {
    let out = "3b2e9a...  bridge.tar.gz\n";
    assert_eq!(parse_remote_sha256("sha256sum bridge.tar.gz", out), Some("3b2e9a...".to_string()));
}

#[test]
fn parses_openssl_dgst_output() {
    let out = "SHA256(bridge.tar.gz)= 3b2e9a...\n";
    assert_eq!(parse_remote_sha256("openssl dgst -sha256 bridge.tar.gz", out), Some("3b2e9a...".to_string()));
}

#[test]
fn empty_output_parses_to_none() {
    assert_eq!(parse_remote_sha256("sha256sum bridge.tar.gz", ""), None);
}
