// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire shapes for §6.1 (plane ← bridge) endpoints other than the command
//! protocol: batch ingest, cron sync, bridge connection audit, preflight.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /ingest/batch`. Envelopes are carried as raw JSON so the
/// per-field validator in `patze-engine` can report the precise rejection
/// reason for each one independently (§4.1, design notes §9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestBatchRequest {
    pub events: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedEvent {
    pub index: usize,
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestBatchResponse {
    pub accepted: u32,
    pub rejected: Vec<RejectedEvent>,
}

/// Body of `POST /openclaw/bridge/cron-sync` (§4.10, §6.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CronSyncRequest {
    pub machine_id: String,
    pub config_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_raw: Option<Value>,
    #[serde(default)]
    pub jobs_delta: Vec<Value>,
    #[serde(default)]
    pub runs_delta: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CronSyncResponse {
    pub config_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_raw: Option<Value>,
}

/// One row of `GET /bridge/connections` (§6.1 audit view).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConnectionDto {
    pub id: String,
    pub host: String,
    pub port: u16,
    pub phase: patze_core::BridgePhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub log_tail: Vec<String>,
}

/// Body of `POST /bridge/preflight` (§6.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreflightRequest {
    pub ssh_host: String,
    pub ssh_port: u16,
    pub ssh_user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_key_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_mode: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreflightResponse {
    pub ok: bool,
    pub mode: String,
    pub ssh_host: String,
    pub ssh_user: String,
    pub ssh_port: u16,
    pub message: String,
    pub auth_method: String,
    pub accepted_new_host_key: bool,
    pub hints: Vec<String>,
}
