// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SSE frame shape for `GET /events` (§4.4, §6.2).
//!
//! `patze-daemon` wraps this in `axum::response::sse::Event`; this module
//! just owns the `data:` payload shape so other crates can build/parse it
//! without depending on axum.

use serde::{Deserialize, Serialize};

use patze_core::Envelope;

/// The JSON body carried by a `data:` line of a `telemetry` SSE frame. The
/// frame's `id:` line carries `envelope.id` separately per §6.2.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryFrame {
    pub envelope: Envelope,
}

impl TelemetryFrame {
    pub fn new(envelope: Envelope) -> Self {
        Self { envelope }
    }
}
