// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bridge Command Protocol (§4.9, §6.3): the control-plane side of the
//! lease machine, plus the admin create/approve/reject/list surface it
//! exposes 1:1 to `patze-cli`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use patze_core::CommandId;
use patze_wire::{BridgeCommandDto, CommandResultDto, CreateCommandRequest, ErrorBody};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollQuery {
    pub machine_id: String,
    #[serde(default = "default_lease_ttl_ms")]
    pub lease_ttl_ms: u64,
}

fn default_lease_ttl_ms() -> u64 {
    crate::env::default_lease_ttl_ms()
}

/// `GET /commands/poll?machineId=…&leaseTtlMs=…` — no matching command is a
/// `200` with `null`, not an error (§7 item 7).
pub async fn poll(
    State(state): State<AppState>,
    Query(query): Query<PollQuery>,
) -> Result<Json<Option<BridgeCommandDto>>, (StatusCode, Json<ErrorBody>)> {
    state
        .command_queue()
        .poll(&query.machine_id, query.lease_ttl_ms)
        .map(|maybe| Json(maybe.as_ref().map(BridgeCommandDto::from)))
        .map_err(storage_err)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AckRequest {
    pub machine_id: String,
}

pub async fn ack_running(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AckRequest>,
) -> Result<Json<Option<BridgeCommandDto>>, (StatusCode, Json<ErrorBody>)> {
    state
        .command_queue()
        .ack_running(&id, &req.machine_id)
        .map(|maybe| Json(maybe.as_ref().map(BridgeCommandDto::from)))
        .map_err(storage_err)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenewLeaseRequest {
    pub machine_id: String,
    pub lease_ttl_ms: u64,
}

pub async fn renew_lease(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<RenewLeaseRequest>,
) -> Result<Json<Option<BridgeCommandDto>>, (StatusCode, Json<ErrorBody>)> {
    state
        .command_queue()
        .renew_lease(&id, &req.machine_id, req.lease_ttl_ms)
        .map(|maybe| Json(maybe.as_ref().map(BridgeCommandDto::from)))
        .map_err(storage_err)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushResultRequest {
    pub machine_id: String,
    #[serde(flatten)]
    pub result: CommandResultDto,
}

pub async fn push_result(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<PushResultRequest>,
) -> Result<Json<Option<BridgeCommandDto>>, (StatusCode, Json<ErrorBody>)> {
    state
        .command_queue()
        .push_result(&id, &req.machine_id, req.result.into())
        .map(|maybe| Json(maybe.as_ref().map(BridgeCommandDto::from)))
        .map_err(storage_err)
}

/// `POST /commands` admin create (§4.9 `create`, exposed to `patze-cli`).
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateCommandRequest>,
) -> Result<Json<BridgeCommandDto>, (StatusCode, Json<ErrorBody>)> {
    state
        .command_queue()
        .create(req.into())
        .map(|cmd| Json(BridgeCommandDto::from(&cmd)))
        .map_err(storage_err)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveRequest {
    pub target_id: String,
    pub target_version: String,
    pub approved_by: String,
}

pub async fn approve(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ApproveRequest>,
) -> Result<Json<Option<BridgeCommandDto>>, (StatusCode, Json<ErrorBody>)> {
    state
        .command_queue()
        .approve(&id, &req.target_id, &req.target_version, &req.approved_by)
        .map(|maybe| Json(maybe.as_ref().map(BridgeCommandDto::from)))
        .map_err(storage_err)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectRequest {
    pub reason: String,
}

pub async fn reject(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<RejectRequest>,
) -> Result<Json<Option<BridgeCommandDto>>, (StatusCode, Json<ErrorBody>)> {
    state
        .command_queue()
        .reject(&id, &req.reason)
        .map(|maybe| Json(maybe.as_ref().map(BridgeCommandDto::from)))
        .map_err(storage_err)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default = "default_list_limit")]
    pub limit: usize,
}

fn default_list_limit() -> usize {
    100
}

pub async fn list(State(state): State<AppState>, Query(query): Query<ListQuery>) -> Json<Vec<BridgeCommandDto>> {
    Json(state.command_queue().list(query.limit).iter().map(BridgeCommandDto::from).collect())
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BridgeCommandDto>, StatusCode> {
    state
        .command_queue()
        .get(&CommandId::from(id))
        .map(|cmd| Json(BridgeCommandDto::from(&cmd)))
        .ok_or(StatusCode::NOT_FOUND)
}

fn storage_err(e: patze_engine::CommandQueueError) -> (StatusCode, Json<ErrorBody>) {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody::new("persist_failed", e.to_string())))
}
