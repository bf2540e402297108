// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `GET /snapshot` (§4.4, §6.2).

use axum::extract::State;
use axum::Json;

use patze_wire::FrontendSnapshotDto;

use crate::state::AppState;

pub async fn get_snapshot(State(state): State<AppState>) -> Json<FrontendSnapshotDto> {
    let snapshot = state.current_snapshot();
    Json(FrontendSnapshotDto::from(&snapshot))
}
