// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduled-task CRUD and rollback-from-snapshot (§3.5, §4.11a
//! `patze-cli task` surface).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use patze_core::clock::now_utc;
use patze_core::{CommandIntent, Schedule, ScheduledTask, SnapshotSource, TaskId, TaskSnapshot, TaskStatus};
use patze_engine::schedule_next_run_at;
use patze_wire::{CommandIntentDto, ErrorBody, ScheduledTaskDto, TaskSnapshotDto};

use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> Json<Vec<ScheduledTaskDto>> {
    Json(state.tasks().iter().map(ScheduledTaskDto::from).collect())
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<ScheduledTaskDto>, StatusCode> {
    state
        .tasks()
        .iter()
        .find(|t| t.id.as_str() == id)
        .map(|t| Json(ScheduledTaskDto::from(t)))
        .ok_or(StatusCode::NOT_FOUND)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub name: String,
    pub description: String,
    pub schedule: Schedule,
    pub action: CommandIntentDto,
    pub timeout_ms: u64,
}

pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<Json<ScheduledTaskDto>, (StatusCode, Json<ErrorBody>)> {
    let now = now_utc(&patze_core::clock::SystemClock);
    let mut task = ScheduledTask {
        id: TaskId::new(),
        name: req.name,
        description: req.description,
        schedule: req.schedule,
        action: CommandIntent::from(req.action),
        timeout_ms: req.timeout_ms,
        status: TaskStatus::Enabled,
        runs: Vec::new(),
        created_at: now,
        updated_at: now,
        next_run_at: None,
    };
    task.next_run_at = schedule_next_run_at(&task, now);

    let mut tasks = state.tasks();
    tasks.push(task.clone());
    state
        .save_tasks_with_auto_snapshot(tasks, format!("create {}", task.name))
        .map_err(storage_err)?;
    Ok(Json(ScheduledTaskDto::from(&task)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub schedule: Option<Schedule>,
    #[serde(default)]
    pub action: Option<CommandIntentDto>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<Json<ScheduledTaskDto>, (StatusCode, Json<ErrorBody>)> {
    let now = now_utc(&patze_core::clock::SystemClock);
    let mut tasks = state.tasks();
    let Some(task) = tasks.iter_mut().find(|t| t.id.as_str() == id) else {
        return Err((StatusCode::NOT_FOUND, Json(ErrorBody::new("not_found", "no such task"))));
    };
    if let Some(name) = req.name {
        task.name = name;
    }
    if let Some(description) = req.description {
        task.description = description;
    }
    if let Some(schedule) = req.schedule {
        task.schedule = schedule;
    }
    if let Some(action) = req.action {
        task.action = CommandIntent::from(action);
    }
    if let Some(timeout_ms) = req.timeout_ms {
        task.timeout_ms = timeout_ms;
    }
    if let Some(status) = req.status {
        task.status = status;
    }
    task.updated_at = now;
    task.next_run_at = schedule_next_run_at(task, now);
    let updated = task.clone();

    state
        .save_tasks_with_auto_snapshot(tasks, format!("update {id}"))
        .map_err(storage_err)?;
    Ok(Json(ScheduledTaskDto::from(&updated)))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<ErrorBody>)> {
    let mut tasks = state.tasks();
    let before = tasks.len();
    tasks.retain(|t| t.id.as_str() != id);
    if tasks.len() == before {
        return Ok(StatusCode::NOT_FOUND);
    }
    state
        .save_tasks_with_auto_snapshot(tasks, format!("delete {id}"))
        .map_err(storage_err)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_snapshots(
    State(state): State<AppState>,
) -> Result<Json<Vec<TaskSnapshotDto>>, (StatusCode, Json<ErrorBody>)> {
    state
        .task_snapshot_store()
        .list()
        .map(|snaps| Json(snaps.iter().map(TaskSnapshotDto::from).collect()))
        .map_err(storage_err)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualSnapshotRequest {
    pub description: String,
}

/// Manual snapshot of the current task set, tagged `manual` (§4.11).
pub async fn create_snapshot(
    State(state): State<AppState>,
    Json(req): Json<ManualSnapshotRequest>,
) -> Result<Json<TaskSnapshotDto>, (StatusCode, Json<ErrorBody>)> {
    let tasks = state.tasks();
    let snapshot = TaskSnapshot {
        id: patze_core::TaskSnapshotId::new(),
        ts: now_utc(&patze_core::clock::SystemClock),
        source: SnapshotSource::Manual,
        description: req.description,
        tasks,
    };
    state.task_snapshot_store().save(&snapshot).map_err(storage_err)?;
    Ok(Json(TaskSnapshotDto::from(&snapshot)))
}

pub async fn rollback(
    State(state): State<AppState>,
    Path(snapshot_id): Path<String>,
) -> Result<Json<Vec<ScheduledTaskDto>>, (StatusCode, Json<ErrorBody>)> {
    let snapshot = state
        .task_snapshot_store()
        .load(&snapshot_id)
        .map_err(storage_err)?
        .ok_or_else(|| (StatusCode::NOT_FOUND, Json(ErrorBody::new("not_found", "no such snapshot"))))?;

    state
        .save_tasks_with_auto_snapshot(snapshot.tasks.clone(), format!("rollback to {snapshot_id}"))
        .map_err(storage_err)?;

    Ok(Json(snapshot.tasks.iter().map(ScheduledTaskDto::from).collect()))
}

fn storage_err(e: patze_storage::StorageError) -> (StatusCode, Json<ErrorBody>) {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody::new("persist_failed", e.to_string())))
}
