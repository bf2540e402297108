// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Production [`RemoteOps`] implementation: everything the lifecycle
//! manager needs, expressed as `exec`/SFTP calls over one [`SshSession`]
//! per managed bridge (§4.7, §4.8).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use patze_core::bridge::BridgeAddr;
use sha2::{Digest, Sha256};

use crate::bridge::install::{InstallAction, RemoteFacts};
use crate::bridge::manager::RemoteOps;
use crate::ssh::auth::SshTarget;
use crate::ssh::transport::{ReverseTunnel, SshSession};

const SHA256_COMMANDS: &[&str] = &["sha256sum", "shasum -a 256", "openssl dgst -sha256"];

/// Where the bridge bundle/install script lands before being invoked
/// (§4.8). The same path `run_install_action` shells out to.
const REMOTE_BUNDLE_PATH: &str = "/tmp/patze-bridge-install.sh";

/// Where the per-target knowledge (user, identity file, local port) needed
/// to open a session for a `(host, port)` bridge id comes from.
pub trait TargetResolver: Send + Sync {
    fn resolve(&self, addr: &BridgeAddr) -> SshTarget;
    fn local_port_for(&self, addr: &BridgeAddr) -> u16;
    fn remote_port_for(&self, addr: &BridgeAddr) -> u16;
    fn known_hosts_path(&self) -> PathBuf;
    /// Local path to the bridge bundle/install script to upload (§4.7a,
    /// §4.8).
    fn bundle_path(&self) -> PathBuf;
}

fn local_sha256(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hasher.finalize().iter().map(|b| format!("{b:02x}")).collect())
}

pub struct SshRemoteOps<T: TargetResolver> {
    resolver: T,
    sessions: Mutex<std::collections::HashMap<String, Arc<tokio::sync::Mutex<SshSession>>>>,
}

impl<T: TargetResolver> SshRemoteOps<T> {
    pub fn new(resolver: T) -> Self {
        Self { resolver, sessions: Mutex::new(std::collections::HashMap::new()) }
    }

    pub fn resolver(&self) -> &T {
        &self.resolver
    }

    async fn session_for(&self, addr: &BridgeAddr) -> Result<Arc<tokio::sync::Mutex<SshSession>>, String> {
        if let Some(existing) = self.sessions.lock().get(&addr.id()) {
            return Ok(existing.clone());
        }
        let target = self.resolver.resolve(addr);
        let session = SshSession::connect(
            &target.host,
            target.port,
            &target.user,
            target.identity_file.as_deref(),
            &self.resolver.known_hosts_path(),
            true,
        )
        .await
        .map_err(|e| e.to_string())?;
        let handle = Arc::new(tokio::sync::Mutex::new(session));
        self.sessions.lock().insert(addr.id(), handle.clone());
        Ok(handle)
    }

    async fn exec(&self, addr: &BridgeAddr, command: &str) -> Result<(String, i32), String> {
        let session = self.session_for(addr).await?;
        let mut session = session.lock().await;
        let out = session.exec(command).await.map_err(|e| e.to_string())?;
        Ok((out.stdout, out.exit_code.unwrap_or(-1)))
    }

    async fn remote_sha256(&self, addr: &BridgeAddr, path: &str) -> Result<Option<String>, String> {
        for command in SHA256_COMMANDS {
            let full = format!("{command} {path} 2>/dev/null");
            if let Ok((stdout, code)) = self.exec(addr, &full).await {
                if code == 0 {
                    if let Some(digest) = crate::bridge::install::parse_remote_sha256(command, &stdout) {
                        return Ok(Some(digest));
                    }
                }
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl<T: TargetResolver + 'static> RemoteOps for SshRemoteOps<T> {
    async fn connect(&self, addr: &BridgeAddr) -> Result<bool, String> {
        let session = self.session_for(addr).await?;
        let outcome = session.lock().await.host_key_outcome();
        Ok(outcome.accepted_new_host_key)
    }

    async fn preflight(&self, addr: &BridgeAddr) -> Result<(), String> {
        let session = self.session_for(addr).await?;
        session.lock().await.preflight().await.map_err(|e| e.to_string())
    }

    async fn open_reverse_forward(&self, addr: &BridgeAddr) -> Result<(), String> {
        let session = self.session_for(addr).await?;
        let remote_port = self.resolver.remote_port_for(addr);
        let local_port = self.resolver.local_port_for(addr);
        let mut session = session.lock().await;
        ReverseTunnel { remote_port, local_port }.run(&mut session).await.map_err(|e| e.to_string())
    }

    async fn gather_facts(&self, addr: &BridgeAddr) -> Result<RemoteFacts, String> {
        let (_, system_code) = self.exec(addr, "systemctl is-active patze-bridge").await?;
        let (_, user_code) = self.exec(addr, "systemctl --user is-active patze-bridge").await?;
        let (id_out, _) = self.exec(addr, "id -u").await?;
        let (_, sudo_cached_code) = self.exec(addr, "sudo -n true").await?;
        let (sudo_path, _) = self.exec(addr, "command -v sudo").await?;

        Ok(RemoteFacts {
            system_unit_active: system_code == 0,
            user_unit_active: user_code == 0,
            is_root: id_out.trim() == "0",
            sudo_cached: sudo_cached_code == 0,
            sudo_present: !sudo_path.trim().is_empty(),
        })
    }

    async fn upload_bundle(&self, addr: &BridgeAddr) -> Result<bool, String> {
        let bundle_path = self.resolver.bundle_path();
        let local_digest = local_sha256(&bundle_path).map_err(|e| e.to_string())?;
        if let Some(remote_digest) = self.remote_sha256(addr, REMOTE_BUNDLE_PATH).await? {
            if remote_digest == local_digest {
                return Ok(false);
            }
        }
        let session = self.session_for(addr).await?;
        let mut session = session.lock().await;
        session
            .upload_file(&bundle_path, REMOTE_BUNDLE_PATH)
            .await
            .map_err(|e| e.to_string())?;
        Ok(true)
    }

    async fn run_install_action(&self, addr: &BridgeAddr, action: InstallAction) -> Result<String, String> {
        let command = match action {
            InstallAction::SystemModeUpdate => "sudo -n systemctl restart patze-bridge",
            InstallAction::UserModeUpdate => "systemctl --user restart patze-bridge",
            InstallAction::FreshSystemInstall => "sh /tmp/patze-bridge-install.sh --system",
            InstallAction::FreshUserInstall => "sh /tmp/patze-bridge-install.sh --user",
            InstallAction::NeedsSudoPassword => {
                return Err("install action requires a sudo password".to_string())
            }
        };
        let (stdout, code) = self.exec(addr, command).await?;
        if code == 0 {
            Ok(stdout)
        } else {
            Err(format!("install action {action:?} exited {code}: {stdout}"))
        }
    }

    async fn run_install_action_with_sudo(
        &self,
        addr: &BridgeAddr,
        action: InstallAction,
        sudo_password: &str,
    ) -> Result<String, String> {
        let inner = match action {
            InstallAction::SystemModeUpdate => "systemctl restart patze-bridge",
            _ => "sh /tmp/patze-bridge-install.sh --system",
        };
        let command = format!("echo {sudo_password} | sudo -S {inner}");
        let (stdout, code) = self.exec(addr, &command).await?;
        if code == 0 {
            Ok(stdout)
        } else {
            Err(format!("sudo install exited {code}"))
        }
    }

    async fn machine_id(&self, addr: &BridgeAddr) -> Result<String, String> {
        let (stdout, code) = self.exec(addr, "cat /etc/machine-id").await?;
        if code == 0 {
            Ok(stdout.trim().to_string())
        } else {
            Err("could not read machine-id".to_string())
        }
    }

    async fn health_check(&self, addr: &BridgeAddr) -> Result<bool, String> {
        let (_, code) = self.exec(addr, "curl -fsS http://127.0.0.1:8787/health").await?;
        Ok(code == 0)
    }
}
