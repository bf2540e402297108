// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! patze-bridge: the remote-host agent. Runs the heartbeat/run-diff loop,
//! the cron sync pusher, the command poller, and a local health/metrics
//! server, all until `SIGTERM`/`SIGINT` (`SIGHUP` triggers a graceful stop
//! so the process supervisor can restart us, mirroring patzed's reload
//! model, §6.5).

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use patze_bridge::collector::{CliCollector, FileCollector, RunSource};
use patze_bridge::command_poller::{self, CommandPoller};
use patze_bridge::cron_sync::{self, CronSyncPusher};
use patze_bridge::env;
use patze_bridge::health;
use patze_bridge::runtime::{self, BridgeRuntime};
use patze_bridge::sink::HttpSink;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _guard = setup_logging();

    let machine_id = env::machine_id();
    let plane_url = env::plane_url();
    info!(%machine_id, %plane_url, "patze-bridge starting");

    let (sink, sink_handle) = HttpSink::spawn(
        plane_url.clone(),
        Some(env::spool_path()),
        env::sink_queue_capacity(),
        env::sink_batch_size(),
        env::sink_flush_interval(),
        env::sink_max_retries(),
    );

    let source = build_run_source();
    let runtime = Arc::new(BridgeRuntime::new(machine_id.clone(), sink.clone(), source));

    let cancel = CancellationToken::new();

    let runtime_task = tokio::spawn(runtime::run_loop(runtime.clone(), env::heartbeat_interval(), cancel.clone()));

    let cron_pusher = CronSyncPusher::new(machine_id.clone(), plane_url.clone(), env::openclaw_dir(), env::cron_sync_state_path());
    let cron_task = tokio::spawn(cron_sync::run_loop(cron_pusher, env::cron_sync_interval(), cancel.clone()));

    let poller = CommandPoller::new(machine_id.clone(), plane_url.clone(), env::command_lease_ttl_ms());
    let poller_task = tokio::spawn(command_poller::run_loop(poller, env::command_poll_interval(), cancel.clone()));

    let health_runtime = runtime.clone();
    let health_addr = env::local_bind_addr();
    let health_task = tokio::spawn(async move {
        if let Err(e) = health::serve(&health_addr, health_runtime).await {
            error!(error = %e, "health/metrics server exited");
        }
    });

    match wait_for_signal().await {
        Ok(reason) => info!(?reason, "shutting down"),
        Err(e) => error!(error = %e, "signal handler failed, shutting down anyway"),
    }

    cancel.cancel();
    let _ = runtime_task.await;
    let _ = cron_task.await;
    let _ = poller_task.await;
    health_task.abort();

    sink_handle.shutdown().await;
    info!("patze-bridge stopped");
    Ok(())
}

fn build_run_source() -> Box<dyn RunSource> {
    match std::env::var("OPENCLAW_BIN") {
        Ok(program) => Box::new(CliCollector { program, args: vec!["runs".to_string(), "--json".to_string()] }),
        Err(_) => Box::new(FileCollector { dir: env::openclaw_dir() }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitReason {
    Shutdown,
    Reload,
}

async fn wait_for_signal() -> std::io::Result<ExitReason> {
    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sighup.recv() => Ok(ExitReason::Reload),
        _ = sigterm.recv() => Ok(ExitReason::Shutdown),
        _ = sigint.recv() => Ok(ExitReason::Shutdown),
    }
}

fn setup_logging() -> tracing_appender::non_blocking::WorkerGuard {
    let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stdout());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(filter).with(fmt::layer().with_writer(non_blocking)).init();
    guard
}
