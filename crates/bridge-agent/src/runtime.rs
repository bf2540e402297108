// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bridge Runtime (§4.6): the supervised heartbeat loop. Each tick emits a
//! heartbeat, collects a run snapshot, diffs it against the last observed
//! set, and flushes the sink.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use serde_json::{json, Value};
use sysinfo::System;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::collector::{diff_runs, ActiveRun, RunSource};
use crate::sink::HttpSink;

/// Ticks after which `/health` reports `degraded` (§4.6).
const DEGRADED_AFTER_FAILURES: u32 = 3;

pub struct BridgeRuntime {
    machine_id: String,
    sink: Arc<HttpSink>,
    source: Box<dyn RunSource>,
    active_runs: Mutex<HashMap<String, ActiveRun>>,
    consecutive_tick_failures: AtomicU32,
    system: Mutex<System>,
}

impl BridgeRuntime {
    pub fn new(machine_id: String, sink: Arc<HttpSink>, source: Box<dyn RunSource>) -> Self {
        Self {
            machine_id,
            sink,
            source,
            active_runs: Mutex::new(HashMap::new()),
            consecutive_tick_failures: AtomicU32::new(0),
            system: Mutex::new(System::new()),
        }
    }

    pub fn consecutive_tick_failures(&self) -> u32 {
        self.consecutive_tick_failures.load(Ordering::Relaxed)
    }

    pub fn is_degraded(&self) -> bool {
        self.consecutive_tick_failures() >= DEGRADED_AFTER_FAILURES
    }

    pub fn sink_stats(&self) -> crate::sink::SinkStats {
        self.sink.stats()
    }

    /// One supervised tick (§4.6 steps 1-4). Collector failures are logged
    /// and counted toward `/health` degradation but never panic the loop.
    pub async fn tick(&self) {
        if let Err(e) = self.sink.ingest(self.heartbeat_envelope()) {
            warn!(error = %e, "failed to enqueue heartbeat");
        }

        match self.source.collect().await {
            Ok(current) => {
                self.consecutive_tick_failures.store(0, Ordering::Relaxed);
                let deltas = {
                    let previous = self.active_runs.lock();
                    diff_runs(&previous, &current)
                };
                for run in &deltas {
                    if let Err(e) = self.sink.ingest(self.run_state_changed_envelope(run)) {
                        warn!(error = %e, run_id = %run.run_id, "failed to enqueue run.state.changed");
                    }
                }
                let mut previous = self.active_runs.lock();
                previous.clear();
                previous.extend(current.into_iter().map(|r| (r.run_id.clone(), r)));
            }
            Err(e) => {
                self.consecutive_tick_failures.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, "run snapshot collection failed");
            }
        }

        self.sink.flush().await;
    }

    fn heartbeat_envelope(&self) -> Value {
        let (cpu_pct, memory_bytes, memory_pct) = self.resource_snapshot();
        envelope(
            &self.machine_id,
            "machine.heartbeat",
            json!({ "resource": { "cpuPct": cpu_pct, "memoryBytes": memory_bytes, "memoryPct": memory_pct } }),
        )
    }

    fn run_state_changed_envelope(&self, run: &ActiveRun) -> Value {
        envelope(
            &self.machine_id,
            "run.state.changed",
            json!({ "runId": run.run_id, "sessionId": run.session_id, "state": run.state }),
        )
    }

    fn resource_snapshot(&self) -> (f64, u64, f64) {
        let mut system = self.system.lock();
        system.refresh_cpu();
        system.refresh_memory();
        let cpu_pct = system.global_cpu_info().cpu_usage() as f64;
        let memory_bytes = system.used_memory();
        let total = system.total_memory().max(1);
        let memory_pct = memory_bytes as f64 / total as f64 * 100.0;
        (cpu_pct, memory_bytes, memory_pct)
    }
}

fn envelope(machine_id: &str, event_type: &str, payload: Value) -> Value {
    json!({
        "version": patze_core::TELEMETRY_VERSION,
        "id": uuid::Uuid::new_v4().to_string(),
        "ts": Utc::now().to_rfc3339(),
        "machineId": machine_id,
        "severity": "info",
        "type": event_type,
        "payload": payload,
        "trace": { "trace_id": uuid::Uuid::new_v4().to_string() },
    })
}

/// Drives [`BridgeRuntime::tick`] on a fixed interval until cancelled.
pub async fn run_loop(runtime: Arc<BridgeRuntime>, interval: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("bridge runtime loop stopping");
                break;
            }
            _ = ticker.tick() => {
                runtime.tick().await;
            }
        }
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
