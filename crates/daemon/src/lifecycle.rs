// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup lock and signal handling (§6.5): `SIGHUP` means reload
//! (graceful stop, then let the process supervisor restart us), `SIGTERM`
//! and `SIGINT` mean shutdown.

use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::PathBuf;

use fs2::FileExt;
use thiserror::Error;
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

use crate::env;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("another patzed instance is already running (lock held at {0:?})")]
    LockHeld(PathBuf),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Held for the process lifetime; dropping it releases the exclusive lock.
pub struct InstanceLock {
    _file: std::fs::File,
    path: PathBuf,
}

/// Acquire the single-instance lock under the state directory, writing our
/// PID once held (§6.5 — one `patzed` per state directory).
pub fn acquire_instance_lock() -> Result<InstanceLock, LifecycleError> {
    let dir = env::state_dir();
    std::fs::create_dir_all(&dir)?;
    let path = dir.join("patzed.pid");

    let file = OpenOptions::new().write(true).create(true).truncate(false).open(&path)?;
    file.try_lock_exclusive().map_err(|_| LifecycleError::LockHeld(path.clone()))?;

    let mut file = file;
    file.set_len(0)?;
    writeln!(file, "{}", std::process::id())?;

    Ok(InstanceLock { _file: file, path })
}

/// What the signal loop decided: shut down, or reload (stop now, rely on the
/// supervisor to restart us).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Shutdown,
    Reload,
}

/// Wait for `SIGHUP`, `SIGTERM`, or `SIGINT`.
pub async fn wait_for_signal() -> Result<ExitReason, LifecycleError> {
    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sighup.recv() => {
            info!("received SIGHUP, reloading");
            Ok(ExitReason::Reload)
        }
        _ = sigterm.recv() => {
            info!("received SIGTERM, shutting down");
            Ok(ExitReason::Shutdown)
        }
        _ = sigint.recv() => {
            info!("received SIGINT, shutting down");
            Ok(ExitReason::Shutdown)
        }
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}
