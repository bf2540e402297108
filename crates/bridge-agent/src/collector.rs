// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run snapshot collection and diffing (§4.6 step 2-3): a pluggable source
//! (external CLI or OpenClaw's on-disk run files) produces the set of
//! currently-active runs each tick; the runtime diffs it against the last
//! observed set and emits `run.state.changed` for each delta.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use patze_core::session::LifecycleState;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("failed to run collector command: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("collector command exited non-zero: {0}")]
    NonZeroExit(String),
    #[error("failed to parse collector output: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One currently-active run, as reported by a collector (a simplified,
/// bridge-local analogue of the plane's `Run` read model).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveRun {
    pub run_id: String,
    pub session_id: String,
    pub agent_id: String,
    pub state: LifecycleState,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait RunSource: Send + Sync {
    async fn collect(&self) -> Result<Vec<ActiveRun>, CollectorError>;
}

/// Shells out to an external CLI that prints a JSON array of [`ActiveRun`]
/// on stdout (the OpenClaw CLI's own "list active runs" surface).
pub struct CliCollector {
    pub program: String,
    pub args: Vec<String>,
}

#[async_trait]
impl RunSource for CliCollector {
    async fn collect(&self) -> Result<Vec<ActiveRun>, CollectorError> {
        let output = tokio::process::Command::new(&self.program).args(&self.args).output().await?;
        if !output.status.success() {
            return Err(CollectorError::NonZeroExit(String::from_utf8_lossy(&output.stderr).to_string()));
        }
        let runs: Vec<ActiveRun> = serde_json::from_slice(&output.stdout)?;
        Ok(runs)
    }
}

/// Reads OpenClaw's on-disk run records directly, for hosts without the CLI
/// installed. Each `<dir>/runs/*.json` file holds one [`ActiveRun`].
pub struct FileCollector {
    pub dir: PathBuf,
}

#[async_trait]
impl RunSource for FileCollector {
    async fn collect(&self) -> Result<Vec<ActiveRun>, CollectorError> {
        let runs_dir = self.dir.join("runs");
        let mut entries = match tokio::fs::read_dir(&runs_dir).await {
            Ok(entries) => entries,
            Err(_) => return Ok(Vec::new()),
        };

        let mut runs = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match tokio::fs::read(&path).await {
                Ok(bytes) => match serde_json::from_slice::<ActiveRun>(&bytes) {
                    Ok(run) => runs.push(run),
                    Err(e) => warn!(path = %path.display(), error = %e, "skipping malformed run file"),
                },
                Err(e) => warn!(path = %path.display(), error = %e, "failed to read run file"),
            }
        }
        Ok(runs)
    }
}

/// Runs whose state differs from (or is absent from) the previous
/// observation. The caller is responsible for updating its baseline with
/// the returned set once the corresponding events have been emitted.
pub fn diff_runs(previous: &HashMap<String, ActiveRun>, current: &[ActiveRun]) -> Vec<ActiveRun> {
    current
        .iter()
        .filter(|run| previous.get(&run.run_id).map(|prior| prior.state) != Some(run.state))
        .cloned()
        .collect()
}

#[cfg(test)]
#[path = "collector_tests.rs"]
mod tests;
