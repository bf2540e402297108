// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::atomic::{AtomicBool, Ordering};

fn addr() -> BridgeAddr {
    BridgeAddr { host: "10.0.0.5".to_string(), port: 22 }
}

struct FakeOps {
    facts: RemoteFacts,
    healthy: AtomicBool,
    fail_sudo_install: bool,
}

impl FakeOps {
    fn happy_path() -> Self {
        Self {
            facts: RemoteFacts {
                system_unit_active: false,
                user_unit_active: false,
                is_root: true,
                sudo_cached: false,
                sudo_present: false,
            },
            healthy: AtomicBool::new(true),
            fail_sudo_install: false,
        }
    }

    fn needs_sudo() -> Self {
        Self {
            facts: RemoteFacts {
                system_unit_active: false,
                user_unit_active: false,
                is_root: false,
                sudo_cached: false,
                sudo_present: true,
            },
            healthy: AtomicBool::new(true),
            fail_sudo_install: false,
        }
    }
}

#[async_trait]
impl RemoteOps for FakeOps {
    async fn connect(&self, _addr: &BridgeAddr) -> Result<bool, String> {
        Ok(false)
    }
    async fn preflight(&self, _addr: &BridgeAddr) -> Result<(), String> {
        Ok(())
    }
    async fn open_reverse_forward(&self, _addr: &BridgeAddr) -> Result<(), String> {
        Ok(())
    }
    async fn gather_facts(&self, _addr: &BridgeAddr) -> Result<RemoteFacts, String> {
        Ok(self.facts)
    }
    async fn upload_bundle(&self, _addr: &BridgeAddr) -> Result<bool, String> {
        Ok(false)
    }
    async fn run_install_action(&self, _addr: &BridgeAddr, _action: InstallAction) -> Result<String, String> {
        Ok("installed".to_string())
    }
    async fn run_install_action_with_sudo(
        &self,
        _addr: &BridgeAddr,
        _action: InstallAction,
        _sudo_password: &str,
    ) -> Result<String, String> {
        if self.fail_sudo_install {
            Err("sudo: incorrect password".to_string())
        } else {
            Ok("installed with sudo".to_string())
        }
    }
    async fn machine_id(&self, _addr: &BridgeAddr) -> Result<String, String> {
        Ok("machine-abc".to_string())
    }
    async fn health_check(&self, _addr: &BridgeAddr) -> Result<bool, String> {
        Ok(self.healthy.load(Ordering::SeqCst))
    }
}

#[tokio::test]
async fn happy_path_reaches_telemetry_active() {
    let manager = BridgeManager::new(Arc::new(FakeOps::happy_path()));
    let state = manager.setup(addr()).await.unwrap();
    assert_eq!(state.phase, BridgePhase::TelemetryActive);
    assert_eq!(state.machine_id.as_deref(), Some("machine-abc"));
}

#[tokio::test]
async fn second_setup_call_is_a_dedup_no_op() {
    let manager = BridgeManager::new(Arc::new(FakeOps::happy_path()));
    manager.setup(addr()).await.unwrap();
    let again = manager.setup(addr()).await.unwrap();
    assert_eq!(again.phase, BridgePhase::TelemetryActive);
}

#[tokio::test]
async fn sudo_required_pauses_in_needs_sudo_password() {
    let manager = BridgeManager::new(Arc::new(FakeOps::needs_sudo()));
    let state = manager.setup(addr()).await.unwrap();
    assert_eq!(state.phase, BridgePhase::NeedsSudoPassword);
    assert!(state.pending_sudo);
}

#[tokio::test]
async fn retry_with_sudo_password_resumes_to_telemetry_active() {
    let manager = BridgeManager::new(Arc::new(FakeOps::needs_sudo()));
    manager.setup(addr()).await.unwrap();
    let state = manager.retry_with_sudo_password(&addr(), "hunter2").await.unwrap();
    assert_eq!(state.phase, BridgePhase::TelemetryActive);
    assert!(!state.pending_sudo);
}

#[tokio::test]
async fn failed_sudo_install_falls_through_to_user_mode() {
    let mut ops = FakeOps::needs_sudo();
    ops.fail_sudo_install = true;
    let manager = BridgeManager::new(Arc::new(ops));
    manager.setup(addr()).await.unwrap();
    let state = manager.retry_with_sudo_password(&addr(), "wrong").await.unwrap();
    assert_eq!(state.phase, BridgePhase::TelemetryActive);
}

#[test]
fn transient_failure_schedules_backoff() {
    let manager = BridgeManager::new(Arc::new(FakeOps::happy_path()));
    let entries_addr = addr();
    manager.entries.lock().insert(
        entries_addr.id(),
        BridgeEntry { state: ManagedBridge::new(entries_addr.clone()), log: LogRingBuffer::new(200) },
    );
    let delay = manager.record_failure(&entries_addr, "connection timed out");
    assert_eq!(delay, Some(std::time::Duration::from_secs(4)));
}

#[test]
fn non_transient_failure_does_not_schedule_retry() {
    let manager = BridgeManager::new(Arc::new(FakeOps::happy_path()));
    let entries_addr = addr();
    manager.entries.lock().insert(
        entries_addr.id(),
        BridgeEntry { state: ManagedBridge::new(entries_addr.clone()), log: LogRingBuffer::new(200) },
    );
    let delay = manager.record_failure(&entries_addr, "permission denied (publickey)");
    assert_eq!(delay, None);
}
