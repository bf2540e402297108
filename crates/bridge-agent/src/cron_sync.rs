// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cron Sync Pusher (§4.10): tails OpenClaw's on-disk jobs/runs directory and
//! pushes incremental diffs to the plane. A watermark file tracks a byte
//! offset per run log so restarts never resend historical run records. When
//! the plane echoes back a different config hash, `openclaw.json` is
//! mirrored locally.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use patze_storage::atomic::{load_json_or_default, write_atomic};
use patze_wire::{CronSyncRequest, CronSyncResponse};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Watermark {
    /// Byte offset already pushed, per run log file name.
    run_log_offsets: HashMap<String, u64>,
    last_config_hash: Option<String>,
}

pub struct CronSyncPusher {
    machine_id: String,
    plane_url: String,
    openclaw_dir: PathBuf,
    state_path: PathBuf,
    client: reqwest::Client,
}

impl CronSyncPusher {
    pub fn new(machine_id: String, plane_url: String, openclaw_dir: PathBuf, state_path: PathBuf) -> Self {
        Self {
            machine_id,
            plane_url,
            openclaw_dir,
            state_path,
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
        }
    }

    /// One sync pass: read the config file and any new run-log lines, push
    /// the diff, then mirror the plane's config back if it disagrees.
    pub async fn tick(&self) {
        let mut watermark: Watermark = load_json_or_default(&self.state_path, Watermark::default);

        let config_path = self.openclaw_dir.join("openclaw.json");
        let config_raw = tokio::fs::read(&config_path).await.ok();
        let config_hash = config_raw.as_deref().map(hex_sha256).unwrap_or_default();

        let jobs_delta = self.read_jobs().await;
        let runs_delta = self.read_new_run_lines(&mut watermark).await;

        if config_hash.is_empty() && jobs_delta.is_empty() && runs_delta.is_empty() {
            return;
        }

        let include_config_raw = watermark.last_config_hash.as_deref() != Some(config_hash.as_str());
        let body = CronSyncRequest {
            machine_id: self.machine_id.clone(),
            config_hash: config_hash.clone(),
            config_raw: if include_config_raw { config_raw.as_deref().and_then(|b| serde_json::from_slice(b).ok()) } else { None },
            jobs_delta,
            runs_delta,
        };

        let url = format!("{}/openclaw/bridge/cron-sync", self.plane_url);
        match self.client.post(&url).json(&body).send().await {
            Ok(resp) if resp.status().is_success() => match resp.json::<CronSyncResponse>().await {
                Ok(parsed) => {
                    watermark.last_config_hash = Some(config_hash.clone());
                    if let Err(e) = write_atomic(&self.state_path, &serde_json::to_vec(&watermark).unwrap_or_default(), false) {
                        warn!(error = %e, "failed to persist cron-sync watermark");
                    }
                    // The plane holds the canonical config; mirror it locally whenever
                    // its declared hash disagrees with what we just computed.
                    if parsed.config_hash != config_hash {
                        if let Some(raw) = parsed.config_raw {
                            self.mirror_config(&raw).await;
                        }
                    }
                }
                Err(e) => warn!(error = %e, "failed to parse cron-sync response"),
            },
            Ok(resp) => warn!(status = %resp.status(), "cron-sync push rejected"),
            Err(e) => warn!(error = %e, "cron-sync push failed"),
        }
    }

    async fn read_jobs(&self) -> Vec<Value> {
        let path = self.openclaw_dir.join("jobs.json");
        match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_default(),
            Err(_) => Vec::new(),
        }
    }

    async fn read_new_run_lines(&self, watermark: &mut Watermark) -> Vec<Value> {
        let runs_dir = self.openclaw_dir.join("runs");
        let mut entries = match tokio::fs::read_dir(&runs_dir).await {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        let mut delta = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("jsonl") {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            let offset = watermark.run_log_offsets.get(&name).copied().unwrap_or(0);
            let Ok(bytes) = tokio::fs::read(&path).await else { continue };
            if (bytes.len() as u64) <= offset {
                continue;
            }
            let tail = &bytes[offset as usize..];
            let mut consumed = 0u64;
            for line in tail.split(|b| *b == b'\n') {
                if line.is_empty() {
                    consumed += 1;
                    continue;
                }
                match serde_json::from_slice::<Value>(line) {
                    Ok(value) => {
                        delta.push(value);
                        consumed += line.len() as u64 + 1;
                    }
                    Err(_) => {
                        // incomplete trailing line; stop here and retry next tick.
                        break;
                    }
                }
            }
            watermark.run_log_offsets.insert(name, offset + consumed);
        }
        delta
    }

    async fn mirror_config(&self, raw: &Value) {
        let path = self.openclaw_dir.join("openclaw.json");
        let bytes = match serde_json::to_vec_pretty(raw) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "failed to serialize mirrored openclaw config");
                return;
            }
        };
        if let Err(e) = write_atomic(&path, &bytes, true) {
            warn!(error = %e, "failed to mirror openclaw config");
        } else {
            debug!("mirrored openclaw config from plane");
        }
    }
}

fn hex_sha256(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Drives [`CronSyncPusher::tick`] on a fixed interval until cancelled.
pub async fn run_loop(pusher: CronSyncPusher, interval: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => pusher.tick().await,
        }
    }
}

#[cfg(test)]
#[path = "cron_sync_tests.rs"]
mod tests;
