// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The install-phase decision table (§4.8), expressed as a pure function
//! over facts gathered from the target so it can be unit-tested without a
//! live SSH session.

/// What the lifecycle manager observed about the target before deciding how
/// to install or update the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteFacts {
    pub system_unit_active: bool,
    pub user_unit_active: bool,
    pub is_root: bool,
    pub sudo_cached: bool,
    pub sudo_present: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivilegeLevel {
    Root,
    SudoCached,
    SudoAvailable,
    None,
}

pub fn detect_privilege(facts: &RemoteFacts) -> PrivilegeLevel {
    if facts.is_root {
        PrivilegeLevel::Root
    } else if facts.sudo_cached {
        PrivilegeLevel::SudoCached
    } else if facts.sudo_present {
        PrivilegeLevel::SudoAvailable
    } else {
        PrivilegeLevel::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallAction {
    /// `systemctl is-active patze-bridge` already succeeds: upload if the
    /// bundle hash changed, then `sudo -n systemctl restart`.
    SystemModeUpdate,
    /// A user-mode unit is already active: upload to
    /// `$HOME/patze-bridge/bridge.mjs` if changed, `systemctl --user restart`.
    UserModeUpdate,
    /// No active service: perform a fresh system-mode install (root or
    /// cached sudo).
    FreshSystemInstall,
    /// No active service and no usable root/sudo: fresh user-mode install.
    FreshUserInstall,
    /// No active service, sudo present but requires a password we don't
    /// have yet.
    NeedsSudoPassword,
}

/// Apply the §4.8 install decision table to the gathered facts.
pub fn decide_install_action(facts: &RemoteFacts) -> InstallAction {
    if facts.system_unit_active {
        return InstallAction::SystemModeUpdate;
    }
    if facts.user_unit_active {
        return InstallAction::UserModeUpdate;
    }
    match detect_privilege(facts) {
        PrivilegeLevel::Root | PrivilegeLevel::SudoCached => InstallAction::FreshSystemInstall,
        PrivilegeLevel::SudoAvailable => InstallAction::NeedsSudoPassword,
        PrivilegeLevel::None => InstallAction::FreshUserInstall,
    }
}

/// Remote SHA-256 obtained by trying, in order, `sha256sum`, `shasum -a
/// 256`, `openssl dgst -sha256` — returns the first non-empty parsed digest.
pub fn parse_remote_sha256(command: &str, output: &str) -> Option<String> {
    let output = output.trim();
    if output.is_empty() {
        return None;
    }
    if command.starts_with("openssl") {
        // `openssl dgst -sha256` prints `SHA256(file)= <hex>`.
        return output.rsplit('=').next().map(|s| s.trim().to_string());
    }
    // `sha256sum`/`shasum -a 256` print `<hex>  <file>`.
    output.split_whitespace().next().map(str::to_string)
}

#[cfg(test)]
#[path = "install_tests.rs"]
mod tests;
