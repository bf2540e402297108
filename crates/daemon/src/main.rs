// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! patzed: the control plane daemon. Owns the HTTP ingest/snapshot/SSE
//! surface, the Bridge Command Queue, the Bridge Lifecycle Manager, and
//! scheduled-task persistence (§2).

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use patze_daemon::{env, http, lifecycle, state::AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _guard = setup_logging();

    let lock = match lifecycle::acquire_instance_lock() {
        Ok(lock) => lock,
        Err(e) => {
            error!(error = %e, "failed to acquire instance lock");
            return Err(e.into());
        }
    };

    let state = AppState::load()?;
    let app = http::router(state);

    let bind_addr = env::bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "patzed listening");

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());
    server.await?;

    drop(lock);
    info!("patzed stopped");
    Ok(())
}

async fn shutdown_signal() {
    match lifecycle::wait_for_signal().await {
        Ok(reason) => info!(?reason, "shutting down"),
        Err(e) => error!(error = %e, "signal handler failed, shutting down anyway"),
    }
    tokio::time::sleep(env::drain_timeout()).await;
}

fn setup_logging() -> tracing_appender::non_blocking::WorkerGuard {
    let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stdout());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(filter).with(fmt::layer().with_writer(non_blocking)).init();
    guard
}
