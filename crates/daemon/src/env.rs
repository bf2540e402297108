// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

/// Resolve state directory: `PATZE_STATE_DIR` > `XDG_STATE_HOME/patze` >
/// `~/.local/state/patze`.
pub fn state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PATZE_STATE_DIR") {
        return PathBuf::from(dir);
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("patze");
    }
    dirs::home_dir().unwrap_or_default().join(".local/state/patze")
}

pub fn command_store_path() -> PathBuf {
    state_dir().join("commands.json")
}

pub fn task_store_path() -> PathBuf {
    state_dir().join("tasks.json")
}

pub fn task_history_path() -> PathBuf {
    state_dir().join("task-runs.jsonl")
}

pub fn task_snapshot_dir() -> PathBuf {
    state_dir().join("task-snapshots")
}

/// HTTP bind address, default `127.0.0.1:8737`.
pub fn bind_addr() -> String {
    std::env::var("PATZE_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8737".to_string())
}

/// Event store retention bound (§4.2 default 100,000).
pub fn event_store_capacity() -> usize {
    std::env::var("PATZE_EVENT_STORE_CAPACITY")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(patze_engine::event_store::DEFAULT_CAPACITY)
}

/// Threshold after which the snapshot endpoint reports `degraded` health
/// because the event stream has been disconnected from its upstream for
/// too long (§4.4).
pub fn stream_degraded_after() -> Duration {
    std::env::var("PATZE_STREAM_DEGRADED_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(30))
}

/// Default lease TTL handed out by `/commands/poll` when the bridge doesn't
/// specify one.
pub fn default_lease_ttl_ms() -> u64 {
    std::env::var("PATZE_DEFAULT_LEASE_TTL_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(30_000)
}

/// Graceful shutdown drain timeout.
pub fn drain_timeout() -> Duration {
    std::env::var("PATZE_DRAIN_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

/// Local path to the bridge bundle/install script uploaded to managed
/// hosts (§4.7a, §4.8), default the packaged install script alongside the
/// daemon binary.
pub fn bridge_bundle_path() -> PathBuf {
    if let Ok(path) = std::env::var("PATZE_BRIDGE_BUNDLE_PATH") {
        return PathBuf::from(path);
    }
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|dir| dir.join("patze-bridge-install.sh")))
        .unwrap_or_else(|| PathBuf::from("/usr/share/patze/patze-bridge-install.sh"))
}
