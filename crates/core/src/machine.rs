// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Machine` read model (§3.2).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::telemetry::MachineId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MachineKind {
    Local,
    Vps,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MachineStatus {
    Online,
    Degraded,
    Offline,
}

/// Last observed resource snapshot carried on a heartbeat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    pub cpu_pct: f64,
    pub memory_bytes: u64,
    pub memory_pct: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_rx: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_tx: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_used_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_total_bytes: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    pub id: MachineId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub kind: MachineKind,
    pub status: MachineStatus,
    pub last_seen_at: DateTime<Utc>,
    pub last_event_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_resource: Option<ResourceSnapshot>,
}

impl Machine {
    /// Ghost-machine test (§3.3): unnamed, stale, and not propped up by a
    /// recent session/run reference.
    pub fn is_ghost(&self, now: DateTime<Utc>, ghost_window: chrono::Duration, referenced_recently: bool) -> bool {
        let unnamed = self.name.as_deref().map(str::is_empty).unwrap_or(true);
        let stale = now - self.last_seen_at > ghost_window;
        unnamed && stale && !referenced_recently
    }
}
