// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bridge Lifecycle Manager (§4.8) — the phase state machine that drives a
//! managed bridge from `connecting` through `telemetry_active`, and the
//! auto-retry loop that revives it from `error`.
//!
//! Remote command execution (exec, SFTP upload, SHA-256 compare) is behind
//! the [`RemoteOps`] trait rather than called directly against
//! [`crate::ssh::SshSession`], the same seam the agent adapters use for
//! `docker exec`/`kubectl exec` — the state machine is exercised in tests
//! against a fake, and wired to a real `SshSession`-backed implementation
//! at the daemon boundary.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use patze_core::bridge::{BridgeAddr, BridgePhase};
use thiserror::Error;

use crate::bridge::install::{decide_install_action, InstallAction, RemoteFacts};
use crate::bridge::retry::{backoff_for_attempt, is_transient, MAX_ATTEMPTS};
use crate::bridge::scrub::LogRingBuffer;

const LOG_CAPACITY: usize = 200;
const TELEMETRY_POLL_TOTAL_SECS: u64 = 30;
const TELEMETRY_POLL_INTERVAL_SECS: u64 = 2;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("no managed bridge for {0}")]
    NotFound(String),
    #[error("bridge {0} is not in needs_sudo_password")]
    NotAwaitingSudo(String),
    #[error("remote operation failed: {0}")]
    Remote(String),
}

/// What the lifecycle manager needs from a live connection. Implemented in
/// production against [`crate::ssh::SshSession`]; faked in tests.
#[async_trait]
pub trait RemoteOps: Send + Sync {
    async fn connect(&self, addr: &BridgeAddr) -> Result<bool, String>;
    async fn preflight(&self, addr: &BridgeAddr) -> Result<(), String>;
    async fn open_reverse_forward(&self, addr: &BridgeAddr) -> Result<(), String>;
    async fn gather_facts(&self, addr: &BridgeAddr) -> Result<RemoteFacts, String>;
    /// Upload the bridge bundle/install script if its content changed since
    /// the last upload (SHA-256 compare). Returns whether a transfer
    /// happened (§4.7a, §4.8).
    async fn upload_bundle(&self, addr: &BridgeAddr) -> Result<bool, String>;
    async fn run_install_action(&self, addr: &BridgeAddr, action: InstallAction) -> Result<String, String>;
    async fn run_install_action_with_sudo(
        &self,
        addr: &BridgeAddr,
        action: InstallAction,
        sudo_password: &str,
    ) -> Result<String, String>;
    async fn machine_id(&self, addr: &BridgeAddr) -> Result<String, String>;
    async fn health_check(&self, addr: &BridgeAddr) -> Result<bool, String>;
}

#[derive(Debug, Clone)]
pub struct ManagedBridge {
    pub addr: BridgeAddr,
    pub phase: BridgePhase,
    pub advisory: Option<String>,
    pub attempt: u32,
    pub machine_id: Option<String>,
    pub pending_sudo: bool,
}

impl ManagedBridge {
    fn new(addr: BridgeAddr) -> Self {
        Self {
            addr,
            phase: BridgePhase::Connecting,
            advisory: None,
            attempt: 0,
            machine_id: None,
            pending_sudo: false,
        }
    }
}

struct BridgeEntry {
    state: ManagedBridge,
    log: LogRingBuffer,
}

/// Owns every managed bridge's phase and log ring buffer; all setup and
/// retry flows pass through here (§4.8 step 1's dedup rule).
pub struct BridgeManager<R: RemoteOps> {
    ops: Arc<R>,
    entries: Mutex<HashMap<String, BridgeEntry>>,
}

impl<R: RemoteOps> BridgeManager<R> {
    pub fn new(ops: Arc<R>) -> Self {
        Self { ops, entries: Mutex::new(HashMap::new()) }
    }

    pub fn ops(&self) -> &R {
        &self.ops
    }

    pub fn state(&self, addr: &BridgeAddr) -> Option<ManagedBridge> {
        self.entries.lock().get(&addr.id()).map(|e| e.state.clone())
    }

    /// Every managed bridge's current state, for the `/bridge/connections`
    /// audit view (§6.1).
    pub fn all(&self) -> Vec<ManagedBridge> {
        self.entries.lock().values().map(|e| e.state.clone()).collect()
    }

    fn log(&self, addr: &BridgeAddr, line: &str) {
        if let Some(entry) = self.entries.lock().get_mut(&addr.id()) {
            entry.log.push(line);
        }
    }

    pub fn logs(&self, addr: &BridgeAddr) -> Vec<String> {
        self.entries
            .lock()
            .get(&addr.id())
            .map(|e| e.log.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Drops the managed entry for `addr` (§4.11a `bridge remove`). Does not
    /// tear down an in-flight SSH session; the next `setup` for this address
    /// starts fresh from `connecting`.
    pub fn remove(&self, addr: &BridgeAddr) -> Option<ManagedBridge> {
        self.entries.lock().remove(&addr.id()).map(|e| e.state)
    }

    /// Idempotent setup for `(host, port)` (§4.8 step 1–7).
    pub async fn setup(&self, addr: BridgeAddr) -> Result<ManagedBridge, BridgeError> {
        {
            let mut entries = self.entries.lock();
            if let Some(existing) = entries.get(&addr.id()) {
                if !existing.state.phase.is_stale_for_dedup() {
                    return Ok(existing.state.clone());
                }
            }
            entries.insert(addr.id(), BridgeEntry { state: ManagedBridge::new(addr.clone()), log: LogRingBuffer::new(LOG_CAPACITY) });
        }
        self.run_setup(addr).await
    }

    async fn set_phase(&self, addr: &BridgeAddr, phase: BridgePhase) {
        if let Some(entry) = self.entries.lock().get_mut(&addr.id()) {
            entry.state.phase = phase;
        }
    }

    async fn run_setup(&self, addr: BridgeAddr) -> Result<ManagedBridge, BridgeError> {
        self.set_phase(&addr, BridgePhase::Connecting).await;
        let accepted_new_key = self.ops.connect(&addr).await.map_err(BridgeError::Remote)?;
        if accepted_new_key {
            if let Some(entry) = self.entries.lock().get_mut(&addr.id()) {
                entry.state.advisory = Some("accepted a new host key under trust-on-first-use".to_string());
            }
        }

        self.set_phase(&addr, BridgePhase::SshTest).await;
        self.ops.preflight(&addr).await.map_err(BridgeError::Remote)?;

        self.set_phase(&addr, BridgePhase::TunnelOpen).await;
        self.ops.open_reverse_forward(&addr).await.map_err(BridgeError::Remote)?;

        self.set_phase(&addr, BridgePhase::Installing).await;
        let facts = self.ops.gather_facts(&addr).await.map_err(BridgeError::Remote)?;
        let action = decide_install_action(&facts);
        if action == InstallAction::NeedsSudoPassword {
            self.set_phase(&addr, BridgePhase::NeedsSudoPassword).await;
            if let Some(entry) = self.entries.lock().get_mut(&addr.id()) {
                entry.state.pending_sudo = true;
            }
            return self.state(&addr).ok_or(BridgeError::NotFound(addr.id()));
        }
        self.ops.upload_bundle(&addr).await.map_err(BridgeError::Remote)?;
        let output = self.ops.run_install_action(&addr, action).await.map_err(BridgeError::Remote)?;
        self.log(&addr, &output);

        self.finish_post_install(&addr).await
    }

    /// `retryInstallWithSudoPassword` (§4.8): consumes `needs_sudo_password`.
    pub async fn retry_with_sudo_password(&self, addr: &BridgeAddr, sudo_password: &str) -> Result<ManagedBridge, BridgeError> {
        self.require_pending_sudo(addr)?;
        let facts = self.ops.gather_facts(addr).await.map_err(BridgeError::Remote)?;
        let action = decide_install_action(&facts);
        self.ops.upload_bundle(addr).await.map_err(BridgeError::Remote)?;
        match self.ops.run_install_action_with_sudo(addr, action, sudo_password).await {
            Ok(output) => {
                self.log(addr, &output);
                self.clear_pending_sudo(addr);
                self.finish_post_install(addr).await
            }
            Err(_) => {
                // System install with sudo failed: fall through to a fresh
                // user-mode retry, bypassing sudo entirely (§4.8).
                self.clear_pending_sudo(addr);
                self.retry_user_mode(addr).await
            }
        }
    }

    /// `retryInstallUserMode` (§4.8): bypasses sudo entirely.
    pub async fn retry_user_mode(&self, addr: &BridgeAddr) -> Result<ManagedBridge, BridgeError> {
        self.clear_pending_sudo(addr);
        self.ops.upload_bundle(addr).await.map_err(BridgeError::Remote)?;
        let output = self
            .ops
            .run_install_action(addr, InstallAction::FreshUserInstall)
            .await
            .map_err(BridgeError::Remote)?;
        self.log(addr, &output);
        self.finish_post_install(addr).await
    }

    fn require_pending_sudo(&self, addr: &BridgeAddr) -> Result<(), BridgeError> {
        let entries = self.entries.lock();
        let entry = entries.get(&addr.id()).ok_or_else(|| BridgeError::NotFound(addr.id()))?;
        if entry.state.phase != BridgePhase::NeedsSudoPassword {
            return Err(BridgeError::NotAwaitingSudo(addr.id()));
        }
        Ok(())
    }

    fn clear_pending_sudo(&self, addr: &BridgeAddr) {
        if let Some(entry) = self.entries.lock().get_mut(&addr.id()) {
            entry.state.pending_sudo = false;
        }
    }

    /// Step 7: read `machine-id`, mark `running`, then poll `/health` up to
    /// `30s` at `2s` intervals before promoting to `telemetry_active`.
    async fn finish_post_install(&self, addr: &BridgeAddr) -> Result<ManagedBridge, BridgeError> {
        let machine_id = self.ops.machine_id(addr).await.map_err(BridgeError::Remote)?;
        if let Some(entry) = self.entries.lock().get_mut(&addr.id()) {
            entry.state.machine_id = Some(machine_id);
            entry.state.attempt = 0;
        }
        self.set_phase(addr, BridgePhase::Running).await;

        let attempts = TELEMETRY_POLL_TOTAL_SECS / TELEMETRY_POLL_INTERVAL_SECS;
        for _ in 0..attempts {
            if self.ops.health_check(addr).await.unwrap_or(false) {
                self.set_phase(addr, BridgePhase::TelemetryActive).await;
                break;
            }
            tokio::time::sleep(std::time::Duration::from_secs(TELEMETRY_POLL_INTERVAL_SECS)).await;
        }

        self.state(addr).ok_or_else(|| BridgeError::NotFound(addr.id()))
    }

    /// Record a setup/connection failure; if the message matches the
    /// transient vocabulary, schedule an auto-retry with exponential
    /// backoff. Returns the scheduled delay, or `None` if the failure was
    /// not transient or attempts are exhausted (§4.8).
    pub fn record_failure(&self, addr: &BridgeAddr, message: &str) -> Option<std::time::Duration> {
        self.log(addr, message);
        let mut entries = self.entries.lock();
        let entry = entries.get_mut(&addr.id())?;
        entry.state.phase = BridgePhase::Error;
        if !is_transient(message) {
            return None;
        }
        entry.state.attempt += 1;
        if entry.state.attempt > MAX_ATTEMPTS {
            return None;
        }
        backoff_for_attempt(entry.state.attempt)
    }

    /// Re-enter `connecting` and rerun setup for a scheduled auto-retry.
    pub async fn reconnect(&self, addr: BridgeAddr) -> Result<ManagedBridge, BridgeError> {
        self.set_phase(&addr, BridgePhase::Connecting).await;
        self.run_setup(addr).await
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
