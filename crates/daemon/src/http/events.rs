// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `GET /events` SSE stream with `Last-Event-ID` resume (§4.4, §6.2).

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

use patze_wire::sse::TelemetryFrame;

use crate::state::AppState;

/// Build one SSE frame for an envelope: `id: <id>`, `event: telemetry`,
/// `data: <json>` (§4.4).
fn frame_for(envelope: &patze_core::Envelope) -> Event {
    let frame = TelemetryFrame::new(envelope.clone());
    Event::default()
        .id(envelope.id.as_str().to_string())
        .event("telemetry")
        .json_data(&frame)
        .unwrap_or_else(|_| Event::default().event("telemetry").data("{}"))
}

pub async fn get_events(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let last_event_id = headers.get("Last-Event-ID").and_then(|v| v.to_str().ok()).map(str::to_string);

    // Replay whatever is still retained, then switch to the live broadcast
    // feed. A gap between "snapshot the backlog" and "subscribe" is
    // intentionally on the live side: better a rare duplicate delivery than
    // a missed one, since the reducer is idempotent per event id.
    let backlog = state.event_store().events_since(last_event_id.as_deref()).unwrap_or_default();
    let live = BroadcastStream::new(state.event_store().subscribe());

    let backlog_stream = tokio_stream::iter(backlog.into_iter().map(|e| Ok(frame_for(&e))));
    let live_stream = live.filter_map(|item| item.ok().map(|e| Ok(frame_for(&e))));

    let stream = backlog_stream.chain(live_stream);
    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)).text(": keep-alive"))
}
