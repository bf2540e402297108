// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The bridge lifecycle phases observable to UI (§4.8). The state machine
//! that drives these transitions lives in `patze-adapters`; this module
//! only owns the shape so `patze-wire` and the daemon's HTTP layer can
//! describe a bridge without depending on the SSH adapter crate.

use serde::{Deserialize, Serialize};

/// Addressing for a managed bridge: `(host, port)` is its stable id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BridgeAddr {
    pub host: String,
    pub port: u16,
}

impl BridgeAddr {
    pub fn id(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgePhase {
    Connecting,
    SshTest,
    TunnelOpen,
    Installing,
    NeedsSudoPassword,
    Running,
    TelemetryActive,
    Disconnected,
    Error,
    Closing,
}

impl BridgePhase {
    /// `error`/`disconnected` absorb until an explicit auto-retry revives
    /// them; every other phase is part of the forward-progress chain.
    pub fn is_absorbing(self) -> bool {
        matches!(self, BridgePhase::Error | BridgePhase::Disconnected)
    }

    /// A bridge in one of these phases is not a candidate for dedup reuse
    /// on a fresh `setup()` call for the same `(host, port)` (§4.8 step 1):
    /// it is stale and should be cleaned up before a new attempt starts.
    pub fn is_stale_for_dedup(self) -> bool {
        matches!(self, BridgePhase::Closing | BridgePhase::Error | BridgePhase::Disconnected)
    }
}
