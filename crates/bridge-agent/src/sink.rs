// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP Sink with Durable Spool (§4.5): a bounded FIFO of validated
//! envelopes, flushed in batches to the plane's `/ingest/batch` (falling
//! back to per-event `/ingest` for legacy servers), with a circuit breaker
//! over consecutive transient failures and a debounced crash-safe spool.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use patze_storage::atomic::{load_json_or_default, write_atomic};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backoff;

const PERSIST_DEBOUNCE: Duration = Duration::from_millis(250);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const CIRCUIT_THRESHOLD: u32 = 5;
const CIRCUIT_COOLDOWN: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("invalid_envelope: {0}")]
    InvalidEnvelope(String),
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SinkStats {
    pub queue_len: usize,
    pub consecutive_failures: u32,
    pub circuit_open: bool,
    pub dropped_on_hydrate: usize,
    pub total_sent: u64,
    pub total_rejected: u64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SpoolFile {
    events: Vec<Value>,
}

struct SinkState {
    queue: VecDeque<Value>,
    capacity: usize,
    batch_size: usize,
    consecutive_failures: u32,
    circuit_open_until: Option<Instant>,
    dropped_on_hydrate: usize,
    total_sent: u64,
    total_rejected: u64,
}

/// Durable, batched, backpressured path from bridge to plane.
pub struct HttpSink {
    client: reqwest::Client,
    plane_url: String,
    spool_path: Option<PathBuf>,
    max_retries: u32,
    state: Mutex<SinkState>,
    persist_tx: mpsc::UnboundedSender<()>,
}

/// Owns the sink's background tasks; dropping/`shutdown`ing stops them.
pub struct SinkHandle {
    cancel: CancellationToken,
    flush_task: tokio::task::JoinHandle<()>,
    persist_task: tokio::task::JoinHandle<()>,
}

impl HttpSink {
    pub fn spawn(
        plane_url: String,
        spool_path: Option<PathBuf>,
        capacity: usize,
        batch_size: usize,
        flush_interval: Duration,
        max_retries: u32,
    ) -> (Arc<Self>, SinkHandle) {
        let mut queue = VecDeque::new();
        let mut dropped_on_hydrate = 0;
        if let Some(path) = &spool_path {
            let spool = load_json_or_default(path, SpoolFile::default);
            for event in spool.events {
                if queue.len() >= capacity {
                    dropped_on_hydrate += 1;
                    continue;
                }
                queue.push_back(event);
            }
            if dropped_on_hydrate > 0 {
                warn!(dropped_on_hydrate, "spool hydrate exceeded queue capacity");
            }
        }

        let (persist_tx, persist_rx) = mpsc::unbounded_channel();
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build().unwrap_or_default();

        let sink = Arc::new(Self {
            client,
            plane_url,
            spool_path,
            max_retries,
            state: Mutex::new(SinkState {
                queue,
                capacity,
                batch_size,
                consecutive_failures: 0,
                circuit_open_until: None,
                dropped_on_hydrate,
                total_sent: 0,
                total_rejected: 0,
            }),
            persist_tx,
        });

        let cancel = CancellationToken::new();

        let flush_task = {
            let sink = sink.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(flush_interval);
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = ticker.tick() => {
                            sink.flush().await;
                        }
                    }
                }
            })
        };

        let persist_task = {
            let sink = sink.clone();
            tokio::spawn(async move { persist_loop(sink, persist_rx).await })
        };

        (sink, SinkHandle { cancel, flush_task, persist_task })
    }

    /// Validate shape, then enqueue. Rejects with `invalid_envelope` if the
    /// queue is already at capacity (§4.5 `ingest`).
    pub fn ingest(&self, value: Value) -> Result<(), SinkError> {
        patze_engine::validate_and_parse(&value).map_err(|e| SinkError::InvalidEnvelope(e.to_string()))?;

        let mut state = self.state.lock();
        if state.queue.len() >= state.capacity {
            return Err(SinkError::InvalidEnvelope("queue full".to_string()));
        }
        state.queue.push_back(value);
        drop(state);
        self.mark_dirty();
        Ok(())
    }

    pub fn stats(&self) -> SinkStats {
        let state = self.state.lock();
        SinkStats {
            queue_len: state.queue.len(),
            consecutive_failures: state.consecutive_failures,
            circuit_open: state.circuit_open_until.is_some_and(|until| Instant::now() < until),
            dropped_on_hydrate: state.dropped_on_hydrate,
            total_sent: state.total_sent,
            total_rejected: state.total_rejected,
        }
    }

    fn mark_dirty(&self) {
        let _ = self.persist_tx.send(());
    }

    /// One flush attempt: respects the circuit breaker, sends up to
    /// `batch_size` events, and re-queues the chunk on transient failure.
    pub async fn flush(&self) {
        let chunk = {
            let mut state = self.state.lock();
            if let Some(until) = state.circuit_open_until {
                if Instant::now() < until {
                    return;
                }
            }
            if state.queue.is_empty() {
                return;
            }
            let n = state.batch_size.min(state.queue.len());
            state.queue.drain(..n).collect::<Vec<_>>()
        };

        if chunk.is_empty() {
            return;
        }

        // Retry transient failures in-place (with backoff) before giving up
        // on the whole chunk, per §4.5's "retries ... up to maxRetries".
        let mut outcome = self.send_batch(&chunk).await;
        let mut attempt = 1;
        while matches!(outcome, BatchOutcome::Transient) && attempt < self.max_retries {
            tokio::time::sleep(backoff::delay_for_attempt(attempt)).await;
            outcome = self.send_batch(&chunk).await;
            attempt += 1;
        }

        match outcome {
            BatchOutcome::Success { accepted, rejected } => {
                let mut state = self.state.lock();
                state.total_sent += accepted as u64;
                state.total_rejected += rejected as u64;
                state.consecutive_failures = 0;
                state.circuit_open_until = None;
                drop(state);
                self.mark_dirty();
            }
            BatchOutcome::LegacyFallback => {
                self.send_individually(chunk).await;
            }
            BatchOutcome::Transient => {
                self.requeue_front(chunk);
                let mut state = self.state.lock();
                state.consecutive_failures += 1;
                if state.consecutive_failures >= CIRCUIT_THRESHOLD {
                    state.circuit_open_until = Some(Instant::now() + CIRCUIT_COOLDOWN);
                    warn!(cooldown_secs = CIRCUIT_COOLDOWN.as_secs(), "sink circuit breaker open");
                }
                drop(state);
                self.mark_dirty();
            }
            BatchOutcome::NonTransient(reason) => {
                debug!(reason = %reason, dropped = chunk.len(), "dropping non-transient batch");
            }
        }
    }

    async fn send_batch(&self, chunk: &[Value]) -> BatchOutcome {
        let body = patze_wire::IngestBatchRequest { events: chunk.to_vec() };
        let url = format!("{}/ingest/batch", self.plane_url);
        match self.client.post(&url).json(&body).send().await {
            Ok(resp) => {
                let status = resp.status();
                if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::METHOD_NOT_ALLOWED {
                    return BatchOutcome::LegacyFallback;
                }
                if status.is_success() {
                    match resp.json::<patze_wire::IngestBatchResponse>().await {
                        Ok(parsed) => BatchOutcome::Success {
                            accepted: parsed.accepted,
                            rejected: parsed.rejected.len() as u32,
                        },
                        Err(e) => BatchOutcome::NonTransient(e.to_string()),
                    }
                } else if backoff::is_transient_status(Some(status.as_u16())) {
                    BatchOutcome::Transient
                } else {
                    BatchOutcome::NonTransient(format!("http {status}"))
                }
            }
            Err(e) => {
                if e.is_timeout() || e.is_connect() {
                    BatchOutcome::Transient
                } else {
                    BatchOutcome::NonTransient(e.to_string())
                }
            }
        }
    }

    async fn send_individually(&self, chunk: Vec<Value>) {
        let url = format!("{}/ingest", self.plane_url);
        let mut failed = Vec::new();
        let mut sent = 0u64;
        for event in chunk {
            match self.client.post(&url).json(&event).send().await {
                Ok(resp) if resp.status().is_success() => sent += 1,
                Ok(resp) if backoff::is_transient_status(Some(resp.status().as_u16())) => failed.push(event),
                _ => {}
            }
        }
        if sent > 0 {
            let mut state = self.state.lock();
            state.total_sent += sent;
            state.consecutive_failures = 0;
            drop(state);
        }
        if !failed.is_empty() {
            self.requeue_front(failed);
        }
        self.mark_dirty();
    }

    fn requeue_front(&self, chunk: Vec<Value>) {
        let mut state = self.state.lock();
        for event in chunk.into_iter().rev() {
            state.queue.push_front(event);
        }
    }

    /// Synchronous spool write: tmp-then-rename (§4.11 protocol, shared with
    /// `patze-storage`'s other stores).
    fn persist_now(&self) {
        let Some(path) = &self.spool_path else { return };
        let events: Vec<Value> = self.state.lock().queue.iter().cloned().collect();
        if let Err(e) = write_atomic(path, &serde_json::to_vec(&SpoolFile { events }).unwrap_or_default(), false) {
            warn!(error = %e, "failed to persist sink spool");
        }
    }

    /// Best-effort drain: flush repeatedly until the queue stops shrinking,
    /// then persist one last time (§4.5 `close`).
    pub async fn close(&self) {
        loop {
            let before = self.state.lock().queue.len();
            if before == 0 {
                break;
            }
            self.flush().await;
            let after = self.state.lock().queue.len();
            if after >= before {
                break;
            }
        }
        self.persist_now();
        info!(remaining = self.state.lock().queue.len(), "sink closed");
    }
}

enum BatchOutcome {
    Success { accepted: u32, rejected: u32 },
    LegacyFallback,
    Transient,
    NonTransient(String),
}

async fn persist_loop(sink: Arc<HttpSink>, mut rx: mpsc::UnboundedReceiver<()>) {
    while rx.recv().await.is_some() {
        tokio::time::sleep(PERSIST_DEBOUNCE).await;
        while rx.try_recv().is_ok() {}
        sink.persist_now();
    }
}

impl SinkHandle {
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.flush_task.await;
        self.persist_task.abort();
    }
}

#[cfg(test)]
#[path = "sink_tests.rs"]
mod tests;
