// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Target address resolution and private-key path enforcement (§4.7).

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("identity file {0:?} must live under ~/.ssh/")]
    KeyOutsideSshDir(PathBuf),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Fully-resolved connection target, either the caller's explicit fields or
/// substituted from a matching `~/.ssh/config` `Host` alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub identity_file: Option<PathBuf>,
}

/// Parse the handful of `ssh_config` directives we care about for a single
/// `Host <alias>` block: `HostName`, `User`, `Port`, `IdentityFile`.
pub fn resolve_ssh_alias(config: &str, alias: &str) -> Option<SshTarget> {
    let mut in_block = false;
    let mut host_name = None;
    let mut user = None;
    let mut port = 22u16;
    let mut identity_file = None;

    for line in config.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.splitn(2, char::is_whitespace);
        let Some(key) = parts.next() else { continue };
        let value = parts.next().unwrap_or("").trim();

        if key.eq_ignore_ascii_case("Host") {
            if in_block {
                break;
            }
            in_block = value.split_whitespace().any(|pattern| pattern == alias);
            continue;
        }
        if !in_block {
            continue;
        }
        match key.to_ascii_lowercase().as_str() {
            "hostname" => host_name = Some(value.to_string()),
            "user" => user = Some(value.to_string()),
            "port" => port = value.parse().unwrap_or(22),
            "identityfile" => identity_file = Some(PathBuf::from(shellexpand_tilde(value))),
            _ => {}
        }
    }

    if !in_block && host_name.is_none() {
        return None;
    }
    Some(SshTarget {
        host: host_name.unwrap_or_else(|| alias.to_string()),
        port,
        user: user.unwrap_or_else(whoami_fallback),
        identity_file,
    })
}

fn whoami_fallback() -> String {
    std::env::var("USER").unwrap_or_else(|_| "root".to_string())
}

fn shellexpand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest).to_string_lossy().to_string();
        }
    }
    path.to_string()
}

/// Defense-in-depth against path traversal: an identity file must resolve
/// under the user's `~/.ssh/` directory (§4.7).
pub fn enforce_key_under_ssh_dir(path: &Path) -> Result<PathBuf, AuthError> {
    let ssh_dir = dirs::home_dir().unwrap_or_default().join(".ssh");
    let canonical_ssh_dir = ssh_dir.canonicalize().unwrap_or(ssh_dir);
    let canonical_path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if canonical_path.starts_with(&canonical_ssh_dir) {
        Ok(canonical_path)
    } else {
        Err(AuthError::KeyOutsideSshDir(path.to_path_buf()))
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
