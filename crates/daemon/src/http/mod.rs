// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP surface: §6.1 (bridge → plane), §6.2 (UI → plane), §6.3 (plane →
//! bridge command protocol), plus the `patze-cli` admin surface (§4.11a).

pub mod bridge;
pub mod commands;
pub mod cron_sync;
pub mod events;
pub mod ingest;
pub mod snapshot;
pub mod tasks;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let bridge_to_plane = Router::new()
        .route("/ingest", post(ingest::ingest_one))
        .route("/ingest/batch", post(ingest::ingest_batch))
        .route("/openclaw/bridge/cron-sync", post(cron_sync::cron_sync))
        .route("/bridge/connections", get(bridge::list_connections))
        .route("/bridge/preflight", post(bridge::preflight));

    let ui = Router::new().route("/snapshot", get(snapshot::get_snapshot)).route("/events", get(events::get_events));

    let command_protocol = Router::new()
        .route("/commands/poll", get(commands::poll))
        .route("/commands/:id/ack-running", post(commands::ack_running))
        .route("/commands/:id/renew-lease", post(commands::renew_lease))
        .route("/commands/:id/result", post(commands::push_result));

    // Admin surface backing `patze-cli` (§4.11a): not enumerated verbatim in
    // §6.1–6.3, but the operations they expose 1:1.
    let admin = Router::new()
        .route("/commands", get(commands::list).post(commands::create))
        .route("/commands/:id", get(commands::get))
        .route("/commands/:id/approve", post(commands::approve))
        .route("/commands/:id/reject", post(commands::reject))
        .route("/bridges", post(bridge::setup_bridge))
        .route("/bridges/:id", axum::routing::delete(bridge::remove_bridge))
        .route("/bridges/:id/retry-sudo", post(bridge::retry_with_sudo))
        .route("/tasks", get(tasks::list).post(tasks::create))
        .route("/tasks/:id", put(tasks::update).delete(tasks::delete).get(tasks::get))
        .route("/tasks/snapshots", get(tasks::list_snapshots).post(tasks::create_snapshot))
        .route("/tasks/snapshots/:id/rollback", post(tasks::rollback));

    Router::new()
        .merge(bridge_to_plane)
        .merge(ui)
        .merge(command_protocol)
        .merge(admin)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
