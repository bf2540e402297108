// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wires `patze-adapters`' lifecycle manager into the daemon: resolves a
//! `(host, port)` bridge id to its connection target and local/remote
//! tunnel ports (§4.7, §4.8).

use std::collections::HashMap;
use std::path::PathBuf;

use parking_lot::Mutex;
use patze_adapters::bridge::{BridgeManager, SshRemoteOps, TargetResolver};
use patze_core::bridge::BridgeAddr;
use patze_adapters::ssh::SshTarget;

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub target: SshTarget,
    pub local_port: u16,
    pub remote_port: u16,
}

#[derive(Default)]
pub struct ConfigResolver {
    configs: Mutex<HashMap<String, BridgeConfig>>,
    known_hosts_path: Mutex<Option<PathBuf>>,
}

impl ConfigResolver {
    pub fn set(&self, addr: &BridgeAddr, config: BridgeConfig) {
        self.configs.lock().insert(addr.id(), config);
    }

    fn get(&self, addr: &BridgeAddr) -> BridgeConfig {
        self.configs.lock().get(&addr.id()).cloned().unwrap_or_else(|| BridgeConfig {
            target: SshTarget { host: addr.host.clone(), port: addr.port, user: "root".to_string(), identity_file: None },
            local_port: 8787,
            remote_port: 8787,
        })
    }
}

impl TargetResolver for ConfigResolver {
    fn resolve(&self, addr: &BridgeAddr) -> SshTarget {
        self.get(addr).target
    }

    fn local_port_for(&self, addr: &BridgeAddr) -> u16 {
        self.get(addr).local_port
    }

    fn remote_port_for(&self, addr: &BridgeAddr) -> u16 {
        self.get(addr).remote_port
    }

    fn known_hosts_path(&self) -> PathBuf {
        self.known_hosts_path
            .lock()
            .clone()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".ssh/known_hosts"))
    }

    fn bundle_path(&self) -> PathBuf {
        crate::env::bridge_bundle_path()
    }
}

pub type Bridges = BridgeManager<SshRemoteOps<ConfigResolver>>;

pub fn new_bridge_manager() -> Bridges {
    BridgeManager::new(std::sync::Arc::new(SshRemoteOps::new(ConfigResolver::default())))
}
