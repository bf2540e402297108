// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health derivation (§3.3).

use serde::{Deserialize, Serialize};

use crate::machine::MachineStatus;
use crate::telemetry::MachineId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Critical,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineHealth {
    pub machine_id: MachineId,
    pub status: HealthStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub overall: Option<HealthStatus>,
    pub machines: Vec<MachineHealth>,
}

impl MachineStatus {
    pub fn health(self) -> HealthStatus {
        match self {
            MachineStatus::Online => HealthStatus::Healthy,
            MachineStatus::Degraded => HealthStatus::Degraded,
            MachineStatus::Offline => HealthStatus::Critical,
        }
    }
}

impl Health {
    /// Recompute from the current machine set and whether any run has
    /// failed (§3.3's overall-health formula).
    pub fn recompute(machines: &[crate::machine::Machine], any_run_failed: bool) -> Self {
        let mut per_machine: Vec<MachineHealth> = machines
            .iter()
            .map(|m| MachineHealth { machine_id: m.id.clone(), status: m.status.health() })
            .collect();
        per_machine.sort_by(|a, b| a.machine_id.as_str().cmp(b.machine_id.as_str()));

        let overall = if machines.is_empty() {
            HealthStatus::Unknown
        } else if per_machine.iter().any(|m| m.status == HealthStatus::Critical) || any_run_failed {
            HealthStatus::Critical
        } else if per_machine.iter().any(|m| m.status == HealthStatus::Degraded) {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        Health { overall: Some(overall), machines: per_machine }
    }

    /// Force `degraded` when the upstream event stream is disconnected
    /// beyond the HTTP service's threshold (§4.4), without discarding the
    /// per-machine breakdown.
    pub fn mark_stream_degraded(&mut self) {
        if !matches!(self.overall, Some(HealthStatus::Critical)) {
            self.overall = Some(HealthStatus::Degraded);
        }
    }
}
