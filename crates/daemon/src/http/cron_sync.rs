// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `POST /openclaw/bridge/cron-sync` (§4.10, §6.1): the bridge pushes
//! incremental OpenClaw jobs/runs diffs; the plane echoes back the config
//! hash it has on file so the bridge knows whether to push a fresh mirror
//! of `openclaw.json`.

use axum::extract::State;
use axum::Json;
use parking_lot::Mutex;

use patze_wire::{CronSyncRequest, CronSyncResponse};

/// Last config hash seen per machine. Kept in-memory only: a restart simply
/// means the next sync looks like a hash change and the bridge re-pushes its
/// mirror once, which is harmless (§4.10).
#[derive(Default)]
pub struct CronSyncState {
    last_config_hash: Mutex<std::collections::HashMap<String, (String, Option<serde_json::Value>)>>,
}

impl CronSyncState {
    pub fn new() -> Self {
        Self::default()
    }
}

pub async fn cron_sync(
    State(state): State<crate::state::AppState>,
    Json(req): Json<CronSyncRequest>,
) -> Json<CronSyncResponse> {
    // jobsDelta/runsDelta land as events through the normal ingest path in a
    // real deployment; here we fold the config side only, which is this
    // endpoint's distinguishing behavior (§4.10). The bridge is the source
    // of truth for `openclaw.json`: the plane mirrors whatever hash/raw it
    // is sent and echoes the hash back as an ack, so the bridge only needs
    // to re-push the full `configRaw` the first time a machine is seen.
    let mut known = state.cron_sync().last_config_hash.lock();
    let stored = known.entry(req.machine_id.clone()).or_insert_with(|| (String::new(), None));
    stored.0 = req.config_hash.clone();
    if req.config_raw.is_some() {
        stored.1 = req.config_raw.clone();
    }

    Json(CronSyncResponse { config_hash: stored.0.clone(), config_raw: stored.1.clone() })
}
