// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `/bridge/*` (§6.1) plus the admin surface backing `patze-cli bridge
//! setup/list/remove/retry-sudo` (SPEC_FULL §4.11a).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use patze_adapters::ssh::{auth::enforce_key_under_ssh_dir, SshSession, SshTarget};
use patze_core::bridge::BridgeAddr;
use patze_wire::{BridgeConnectionDto, ErrorBody, PreflightRequest, PreflightResponse};

use crate::bridge_registry::BridgeConfig;
use crate::state::AppState;

/// Substrings that earn a user-facing hint (§7 "concise hints").
fn hints_for(message: &str) -> Vec<String> {
    let lower = message.to_ascii_lowercase();
    let mut hints = Vec::new();
    if lower.contains("key") || lower.contains("auth") {
        hints.push("Check SSH alias/key/path and retry".to_string());
    }
    if lower.contains("address in use") || lower.contains("bind") {
        hints.push("Remote port may be in use".to_string());
    }
    hints
}

pub async fn preflight(
    State(_state): State<AppState>,
    Json(req): Json<PreflightRequest>,
) -> Json<PreflightResponse> {
    if let Some(key_path) = &req.ssh_key_path {
        if let Err(e) = enforce_key_under_ssh_dir(std::path::Path::new(key_path)) {
            return Json(PreflightResponse {
                ok: false,
                mode: req.ssh_mode.clone().unwrap_or_default(),
                ssh_host: req.ssh_host.clone(),
                ssh_user: req.ssh_user.clone(),
                ssh_port: req.ssh_port,
                message: e.to_string(),
                auth_method: "key".to_string(),
                accepted_new_host_key: false,
                hints: hints_for(&e.to_string()),
            });
        }
    }

    let known_hosts_path = dirs::home_dir().unwrap_or_default().join(".ssh/known_hosts");
    let identity_file = req.ssh_key_path.as_deref().map(std::path::Path::new);
    match SshSession::connect(&req.ssh_host, req.ssh_port, &req.ssh_user, identity_file, &known_hosts_path, true).await {
        Ok(mut session) => {
            let accepted_new_host_key = session.host_key_outcome().accepted_new_host_key;
            match session.preflight().await {
                Ok(()) => Json(PreflightResponse {
                    ok: true,
                    mode: req.ssh_mode.clone().unwrap_or_else(|| "auto".to_string()),
                    ssh_host: req.ssh_host,
                    ssh_user: req.ssh_user,
                    ssh_port: req.ssh_port,
                    message: "ok".to_string(),
                    auth_method: if req.ssh_key_path.is_some() { "key" } else { "agent" }.to_string(),
                    accepted_new_host_key,
                    hints: Vec::new(),
                }),
                Err(e) => Json(PreflightResponse {
                    ok: false,
                    mode: req.ssh_mode.clone().unwrap_or_default(),
                    ssh_host: req.ssh_host,
                    ssh_user: req.ssh_user,
                    ssh_port: req.ssh_port,
                    message: e.to_string(),
                    auth_method: "key".to_string(),
                    accepted_new_host_key,
                    hints: hints_for(&e.to_string()),
                }),
            }
        }
        Err(e) => Json(PreflightResponse {
            ok: false,
            mode: req.ssh_mode.clone().unwrap_or_default(),
            ssh_host: req.ssh_host,
            ssh_user: req.ssh_user,
            ssh_port: req.ssh_port,
            message: e.to_string(),
            auth_method: "key".to_string(),
            accepted_new_host_key: false,
            hints: hints_for(&e.to_string()),
        }),
    }
}

pub async fn list_connections(State(state): State<AppState>) -> Json<Vec<BridgeConnectionDto>> {
    Json(
        state
            .bridges()
            .all()
            .into_iter()
            .map(|managed| BridgeConnectionDto {
                id: managed.addr.id(),
                host: managed.addr.host.clone(),
                port: managed.addr.port,
                phase: managed.phase,
                error: managed.advisory.clone(),
                log_tail: state.bridges().logs(&managed.addr),
            })
            .collect(),
    )
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupBridgeRequest {
    pub host: String,
    pub port: u16,
    pub user: String,
    #[serde(default)]
    pub identity_file: Option<String>,
    pub local_port: u16,
    pub remote_port: u16,
}

pub async fn setup_bridge(
    State(state): State<AppState>,
    Json(req): Json<SetupBridgeRequest>,
) -> Result<Json<BridgeConnectionDto>, (StatusCode, Json<ErrorBody>)> {
    let addr = BridgeAddr { host: req.host.clone(), port: req.port };
    state.bridges_config().set(
        &addr,
        BridgeConfig {
            target: SshTarget {
                host: req.host,
                port: req.port,
                user: req.user,
                identity_file: req.identity_file.map(std::path::PathBuf::from),
            },
            local_port: req.local_port,
            remote_port: req.remote_port,
        },
    );

    match state.bridges().setup(addr.clone()).await {
        Ok(managed) => Ok(Json(BridgeConnectionDto {
            id: managed.addr.id(),
            host: managed.addr.host,
            port: managed.addr.port,
            phase: managed.phase,
            error: managed.advisory,
            log_tail: state.bridges().logs(&addr),
        })),
        Err(e) => Err((StatusCode::BAD_GATEWAY, Json(ErrorBody::new("bridge_setup_failed", e.to_string())))),
    }
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SudoRetryRequest {
    pub sudo_password: String,
}

pub async fn retry_with_sudo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SudoRetryRequest>,
) -> Result<Json<BridgeConnectionDto>, (StatusCode, Json<ErrorBody>)> {
    let Some(addr) = parse_addr(&id) else {
        return Err((StatusCode::BAD_REQUEST, Json(ErrorBody::new("invalid_id", "expected host:port"))));
    };
    match state.bridges().retry_with_sudo_password(&addr, &req.sudo_password).await {
        Ok(managed) => Ok(Json(BridgeConnectionDto {
            id: managed.addr.id(),
            host: managed.addr.host,
            port: managed.addr.port,
            phase: managed.phase,
            error: managed.advisory,
            log_tail: state.bridges().logs(&addr),
        })),
        Err(e) => Err((StatusCode::BAD_GATEWAY, Json(ErrorBody::new("sudo_retry_failed", e.to_string())))),
    }
}

pub async fn remove_bridge(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    let Some(addr) = parse_addr(&id) else {
        return StatusCode::BAD_REQUEST;
    };
    match state.bridges().remove(&addr) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

fn parse_addr(id: &str) -> Option<BridgeAddr> {
    let (host, port) = id.rsplit_once(':')?;
    Some(BridgeAddr { host: host.to_string(), port: port.parse().ok()? })
}
