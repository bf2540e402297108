// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local `/health` and `/metrics` server (§4.6): reports `ok=true` while
//! `consecutiveTickFailures < 3`, else `degraded` with HTTP 503. `/metrics`
//! renders the sink's stats as Prometheus text.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::runtime::BridgeRuntime;

const BIND_RETRY_ATTEMPTS: u32 = 6;
const BIND_RETRY_SLEEP: Duration = Duration::from_millis(100);

#[derive(Clone)]
struct HealthState {
    runtime: Arc<BridgeRuntime>,
}

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
    consecutive_tick_failures: u32,
    sink: crate::sink::SinkStats,
}

fn router(state: HealthState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<HealthState>) -> Response {
    let body = HealthBody {
        status: if state.runtime.is_degraded() { "degraded" } else { "ok" },
        consecutive_tick_failures: state.runtime.consecutive_tick_failures(),
        sink: state.runtime.sink_stats(),
    };
    let code = if state.runtime.is_degraded() { StatusCode::SERVICE_UNAVAILABLE } else { StatusCode::OK };
    (code, Json(body)).into_response()
}

async fn metrics(State(state): State<HealthState>) -> String {
    let stats = state.runtime.sink_stats();
    let degraded = state.runtime.is_degraded() as u8;
    format!(
        "# HELP patze_bridge_degraded Whether the bridge heartbeat loop is degraded.\n\
         # TYPE patze_bridge_degraded gauge\n\
         patze_bridge_degraded {degraded}\n\
         # HELP patze_bridge_tick_failures Consecutive heartbeat tick failures.\n\
         # TYPE patze_bridge_tick_failures gauge\n\
         patze_bridge_tick_failures {failures}\n\
         # HELP patze_bridge_sink_queue_len Events queued for delivery to the plane.\n\
         # TYPE patze_bridge_sink_queue_len gauge\n\
         patze_bridge_sink_queue_len {queue_len}\n\
         # HELP patze_bridge_sink_circuit_open Whether the sink's circuit breaker is open.\n\
         # TYPE patze_bridge_sink_circuit_open gauge\n\
         patze_bridge_sink_circuit_open {circuit_open}\n\
         # HELP patze_bridge_sink_total_sent Events successfully delivered to the plane.\n\
         # TYPE patze_bridge_sink_total_sent counter\n\
         patze_bridge_sink_total_sent {total_sent}\n",
        degraded = degraded,
        failures = state.runtime.consecutive_tick_failures(),
        queue_len = stats.queue_len,
        circuit_open = stats.circuit_open as u8,
        total_sent = stats.total_sent,
    )
}

/// Binds the local health/metrics listener, retrying on `EADDRINUSE` up to
/// [`BIND_RETRY_ATTEMPTS`] times with a [`BIND_RETRY_SLEEP`] backoff.
pub async fn serve(addr: &str, runtime: Arc<BridgeRuntime>) -> std::io::Result<()> {
    let state = HealthState { runtime };
    let app = router(state);

    let mut attempt = 0;
    let listener = loop {
        match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => break listener,
            Err(e) if e.kind() == std::io::ErrorKind::AddrInUse && attempt < BIND_RETRY_ATTEMPTS => {
                attempt += 1;
                warn!(attempt, %addr, "health listener address in use, retrying");
                tokio::time::sleep(BIND_RETRY_SLEEP).await;
            }
            Err(e) => return Err(e),
        }
    };

    axum::serve(listener, app).await
}
