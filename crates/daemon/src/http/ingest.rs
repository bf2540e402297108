// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `POST /ingest`, `POST /ingest/batch` (§4.4, §6.1).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

use patze_wire::{ErrorBody, IngestBatchRequest, IngestBatchResponse, RejectedEvent};

use crate::state::AppState;

pub async fn ingest_one(
    State(state): State<AppState>,
    Json(raw): Json<Value>,
) -> Result<StatusCode, (StatusCode, Json<ErrorBody>)> {
    match patze_engine::validate_and_parse(&raw) {
        Ok(envelope) => {
            // A duplicate `(machineId, id)` (e.g. a sink retry re-posting an
            // event the plane already accepted) is appended/projected at
            // most once; the response is still 200 either way (§3.1, §8.2).
            if state.event_store().append(envelope.clone()).is_some() {
                state.apply_event(&envelope);
            }
            Ok(StatusCode::OK)
        }
        Err(err) => Err((StatusCode::BAD_REQUEST, Json(ErrorBody::from(&err)))),
    }
}

pub async fn ingest_batch(
    State(state): State<AppState>,
    Json(body): Json<IngestBatchRequest>,
) -> Json<IngestBatchResponse> {
    let mut accepted = 0u32;
    let mut rejected = Vec::new();

    for (index, raw) in body.events.iter().enumerate() {
        match patze_engine::validate_and_parse(raw) {
            Ok(envelope) => {
                if state.event_store().append(envelope.clone()).is_some() {
                    state.apply_event(&envelope);
                }
                accepted += 1;
            }
            Err(err) => {
                rejected.push(RejectedEvent { index, code: err.code().to_string(), message: err.to_string() });
            }
        }
    }

    Json(IngestBatchResponse { accepted, rejected })
}
