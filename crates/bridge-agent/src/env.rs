// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the bridge-agent crate.

use std::path::PathBuf;
use std::time::Duration;

/// Base URL of the control plane, e.g. `http://127.0.0.1:8737`.
pub fn plane_url() -> String {
    std::env::var("PATZE_PLANE_URL").unwrap_or_else(|_| "http://127.0.0.1:8737".to_string())
}

/// Identity this process reports as (§3.1 `machineId`).
pub fn machine_id() -> String {
    std::env::var("PATZE_MACHINE_ID").unwrap_or_else(|_| {
        hostname().unwrap_or_else(|| "unknown-machine".to_string())
    })
}

fn hostname() -> Option<String> {
    std::env::var("HOSTNAME").ok().or_else(|| {
        let out = std::process::Command::new("hostname").output().ok()?;
        String::from_utf8(out.stdout).ok().map(|s| s.trim().to_string())
    })
}

/// Directory holding the spool file and cron-sync watermark state.
pub fn state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PATZE_BRIDGE_STATE_DIR") {
        return PathBuf::from(dir);
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("patze-bridge");
    }
    dirs::home_dir().unwrap_or_default().join(".local/state/patze-bridge")
}

pub fn spool_path() -> PathBuf {
    state_dir().join("sink-spool.json")
}

pub fn cron_sync_state_path() -> PathBuf {
    state_dir().join("cron-sync-state.json")
}

/// Directory OpenClaw writes its jobs/runs/config to (§4.10).
pub fn openclaw_dir() -> PathBuf {
    std::env::var("PATZE_OPENCLAW_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs::home_dir().unwrap_or_default().join(".openclaw"))
}

pub fn heartbeat_interval() -> Duration {
    env_ms("PATZE_HEARTBEAT_INTERVAL_MS", 15_000)
}

pub fn cron_sync_interval() -> Duration {
    env_ms("PATZE_CRON_SYNC_INTERVAL_MS", 30_000)
}

pub fn command_poll_interval() -> Duration {
    env_ms("PATZE_COMMAND_POLL_INTERVAL_MS", 5_000)
}

pub fn command_lease_ttl_ms() -> u64 {
    std::env::var("PATZE_COMMAND_LEASE_TTL_MS").ok().and_then(|s| s.parse().ok()).unwrap_or(30_000)
}

/// Local `/health` + `/metrics` bind address.
pub fn local_bind_addr() -> String {
    std::env::var("PATZE_BRIDGE_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8738".to_string())
}

/// Sink queue capacity `Q` (§4.5 default 10,000).
pub fn sink_queue_capacity() -> usize {
    std::env::var("PATZE_SINK_QUEUE_CAPACITY").ok().and_then(|s| s.parse().ok()).unwrap_or(10_000)
}

pub fn sink_batch_size() -> usize {
    std::env::var("PATZE_SINK_BATCH_SIZE").ok().and_then(|s| s.parse().ok()).unwrap_or(100)
}

pub fn sink_flush_interval() -> Duration {
    env_ms("PATZE_SINK_FLUSH_INTERVAL_MS", 2_000)
}

pub fn sink_max_retries() -> u32 {
    std::env::var("PATZE_SINK_MAX_RETRIES").ok().and_then(|s| s.parse().ok()).unwrap_or(5)
}

pub fn drain_timeout() -> Duration {
    env_ms("PATZE_DRAIN_TIMEOUT_MS", 5_000)
}

fn env_ms(key: &str, default_ms: u64) -> Duration {
    std::env::var(key).ok().and_then(|s| s.parse::<u64>().ok()).map(Duration::from_millis).unwrap_or(Duration::from_millis(default_ms))
}
