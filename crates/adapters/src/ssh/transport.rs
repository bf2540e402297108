// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The SSH session: connect, authenticate, host-key verification, pre-flight,
//! SFTP upload, and the reverse-tunnel channel acceptor (§4.7).
//!
//! Expressed as a channel-consuming worker per handle rather than the
//! source's event-driven callbacks (§9): [`ReverseTunnel::run`] awaits the
//! session for forwarded-channel open requests and spawns one pipe worker
//! per accepted channel, same shape regardless of host language.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use russh::client::{self, Handle};
use russh::{Channel, ChannelMsg, Disconnect};
use russh_keys::key::PublicKey;
use russh_sftp::client::SftpSession;
use thiserror::Error;
use tokio::io::{copy_bidirectional, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::ssh::auth::enforce_key_under_ssh_dir;
use crate::ssh::known_hosts::{self, HostKeyDecision};

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
pub const READY_TIMEOUT: Duration = Duration::from_secs(15);
pub const PREFLIGHT_TIMEOUT: Duration = Duration::from_secs(10);
/// Per-transfer cap on a single SFTP bundle upload (§4.8).
pub const SFTP_TRANSFER_TIMEOUT: Duration = Duration::from_secs(60);
/// Mode a freshly-uploaded bundle is given (§4.8).
pub const UPLOADED_BUNDLE_MODE: u32 = 0o755;

#[derive(Debug, Error)]
pub enum SshError {
    #[error("connect timed out after {0:?}")]
    ConnectTimeout(Duration),
    #[error("host key rejected for {0}")]
    HostKeyRejected(String),
    #[error("authentication failed")]
    AuthFailed,
    #[error("preflight check failed: {0}")]
    PreflightFailed(String),
    #[error("sftp error: {0}")]
    Sftp(String),
    #[error(transparent)]
    Russh(#[from] russh::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Whatever the caller needs to know about how the host key check went, for
/// the advisory surfaced to the operator (§4.8 step 3).
#[derive(Debug, Clone, Default)]
pub struct HostKeyOutcome {
    pub accepted_new_host_key: bool,
}

/// Result of [`SshSession::exec`].
#[derive(Debug, Clone, Default)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

struct TofuHandler {
    known_hosts_path: PathBuf,
    host: String,
    port: u16,
    trust_on_first_use: bool,
    outcome: Arc<Mutex<HostKeyOutcome>>,
    forwarded_channels: mpsc::UnboundedSender<Channel<client::Msg>>,
}

#[async_trait::async_trait]
impl client::Handler for TofuHandler {
    type Error = SshError;

    async fn check_server_key(&mut self, server_public_key: &PublicKey) -> Result<bool, Self::Error> {
        let algo = server_public_key.name().to_string();
        let key_b64 = base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            server_public_key.public_key_bytes(),
        );
        let entries = known_hosts::load(&self.known_hosts_path).unwrap_or_default();
        let decision =
            known_hosts::decide(&entries, &self.host, self.port, &algo, &key_b64, self.trust_on_first_use);

        match decision {
            HostKeyDecision::Pinned => Ok(true),
            HostKeyDecision::TrustedOnFirstUse { .. } => {
                // Best-effort append; failure must not fail the connection (§5).
                let appended =
                    known_hosts::append(&self.known_hosts_path, &self.host, self.port, &algo, &key_b64).is_ok();
                self.outcome.lock().accepted_new_host_key = appended || true;
                Ok(true)
            }
            HostKeyDecision::RejectedNoTofu | HostKeyDecision::RejectedMismatch => Ok(false),
        }
    }

    /// The server forwarding a `tcpip-forward`'d connection back to us
    /// (§4.7). Handed off to [`ReverseTunnel::run`] over an unbounded
    /// channel rather than piped here, since the handler has no business
    /// knowing which local port a forwarded channel pipes to.
    async fn server_channel_open_forwarded_tcpip(
        &mut self,
        channel: Channel<client::Msg>,
        _connected_address: &str,
        _connected_port: u32,
        _originator_address: &str,
        _originator_port: u32,
        _session: &mut client::Session,
    ) -> Result<(), Self::Error> {
        let _ = self.forwarded_channels.send(channel);
        Ok(())
    }
}

pub struct SshSession {
    handle: Handle<TofuHandler>,
    outcome: Arc<Mutex<HostKeyOutcome>>,
    forwarded_channels: mpsc::UnboundedReceiver<Channel<client::Msg>>,
}

impl SshSession {
    /// Connect, verify the host key (TOFU with pinning), then authenticate:
    /// by private key loaded from `identity_file` (enforced to live under
    /// `~/.ssh/`) if given, else by falling back to the `SSH_AUTH_SOCK`
    /// agent (§4.7).
    pub async fn connect(
        host: &str,
        port: u16,
        user: &str,
        identity_file: Option<&Path>,
        known_hosts_path: &Path,
        trust_on_first_use: bool,
    ) -> Result<Self, SshError> {
        let outcome = Arc::new(Mutex::new(HostKeyOutcome::default()));
        let (forwarded_tx, forwarded_rx) = mpsc::unbounded_channel();
        let handler = TofuHandler {
            known_hosts_path: known_hosts_path.to_path_buf(),
            host: host.to_string(),
            port,
            trust_on_first_use,
            outcome: outcome.clone(),
            forwarded_channels: forwarded_tx,
        };
        let config = Arc::new(client::Config {
            connection_timeout: Some(CONNECT_TIMEOUT),
            ..Default::default()
        });

        let mut handle = tokio::time::timeout(READY_TIMEOUT, client::connect(config, (host, port), handler))
            .await
            .map_err(|_| SshError::ConnectTimeout(READY_TIMEOUT))??;

        let authenticated = match identity_file {
            Some(path) => Self::authenticate_with_key(&mut handle, user, path).await?,
            None => Self::authenticate_with_agent(&mut handle, user).await?,
        };
        if !authenticated {
            return Err(SshError::AuthFailed);
        }

        Ok(Self { handle, outcome, forwarded_channels: forwarded_rx })
    }

    async fn authenticate_with_key(
        handle: &mut Handle<TofuHandler>,
        user: &str,
        identity_file: &Path,
    ) -> Result<bool, SshError> {
        let enforced = enforce_key_under_ssh_dir(identity_file).map_err(|_| SshError::AuthFailed)?;
        let key_pair =
            russh_keys::load_secret_key(&enforced, None).map_err(|_| SshError::AuthFailed)?;
        Ok(handle.authenticate_publickey(user, Arc::new(key_pair)).await?)
    }

    /// Fall back to whatever identities `ssh-agent` (via `SSH_AUTH_SOCK`)
    /// offers when no identity file was configured (§4.7).
    async fn authenticate_with_agent(handle: &mut Handle<TofuHandler>, user: &str) -> Result<bool, SshError> {
        let mut agent = russh_keys::agent::client::AgentClient::connect_env()
            .await
            .map_err(|_| SshError::AuthFailed)?;
        let identities = agent.request_identities().await.map_err(|_| SshError::AuthFailed)?;

        for key in identities {
            let (returned_agent, result) = handle.authenticate_future(user, key, agent).await;
            agent = returned_agent;
            if matches!(result, Ok(true)) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn host_key_outcome(&self) -> HostKeyOutcome {
        self.outcome.lock().clone()
    }

    /// Execute `echo ok`; stdout must be exactly `"ok\n"` with exit code 0
    /// (§4.7 pre-flight RPC).
    pub async fn preflight(&mut self) -> Result<(), SshError> {
        let mut channel = self.handle.channel_open_session().await?;
        tokio::time::timeout(PREFLIGHT_TIMEOUT, channel.exec(true, "echo ok"))
            .await
            .map_err(|_| SshError::PreflightFailed("timed out".into()))??;

        let mut stdout = Vec::new();
        let mut exit_status = None;
        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { data } => stdout.extend_from_slice(&data),
                ChannelMsg::ExitStatus { exit_status: code } => exit_status = Some(code),
                ChannelMsg::Eof | ChannelMsg::Close => break,
                _ => {}
            }
        }

        if stdout == b"ok\n" && exit_status == Some(0) {
            Ok(())
        } else {
            Err(SshError::PreflightFailed(format!(
                "stdout={:?} exit={:?}",
                String::from_utf8_lossy(&stdout),
                exit_status
            )))
        }
    }

    /// Run an arbitrary command and collect its stdout/stderr/exit code.
    /// The install decision table and the SFTP SHA-256 fallback chain both
    /// build on this rather than on dedicated RPCs.
    pub async fn exec(&mut self, command: &str) -> Result<ExecOutput, SshError> {
        let mut channel = self.handle.channel_open_session().await?;
        channel.exec(true, command).await?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut exit_status = None;
        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { data } => stdout.extend_from_slice(&data),
                ChannelMsg::ExtendedData { data, ext: 1 } => stderr.extend_from_slice(&data),
                ChannelMsg::ExitStatus { exit_status: code } => exit_status = Some(code as i32),
                ChannelMsg::Eof | ChannelMsg::Close => break,
                _ => {}
            }
        }

        Ok(ExecOutput {
            stdout: String::from_utf8_lossy(&stdout).to_string(),
            stderr: String::from_utf8_lossy(&stderr).to_string(),
            exit_code: exit_status,
        })
    }

    /// Stream `local_path` to `remote_path` over SFTP at
    /// [`UPLOADED_BUNDLE_MODE`], bounded by [`SFTP_TRANSFER_TIMEOUT`] (§4.8).
    pub async fn upload_file(&mut self, local_path: &Path, remote_path: &str) -> Result<(), SshError> {
        let transfer = async {
            let channel = self.handle.channel_open_session().await?;
            channel.request_subsystem(true, "sftp").await?;
            let sftp = SftpSession::new(channel.into_stream())
                .await
                .map_err(|e| SshError::Sftp(e.to_string()))?;

            let bytes = tokio::fs::read(local_path).await?;
            let mut file = sftp.create(remote_path).await.map_err(|e| SshError::Sftp(e.to_string()))?;
            file.write_all(&bytes).await?;
            file.shutdown().await?;
            drop(file);

            let mut attrs = russh_sftp::protocol::FileAttributes::default();
            attrs.permissions = Some(UPLOADED_BUNDLE_MODE);
            sftp.set_metadata(remote_path, attrs).await.map_err(|e| SshError::Sftp(e.to_string()))?;
            Ok::<(), SshError>(())
        };

        tokio::time::timeout(SFTP_TRANSFER_TIMEOUT, transfer)
            .await
            .map_err(|_| SshError::Sftp(format!("transfer of {remote_path} timed out")))?
    }

    pub async fn disconnect(&mut self) -> Result<(), SshError> {
        self.handle.disconnect(Disconnect::ByApplication, "", "en").await?;
        Ok(())
    }
}

/// Reverse tunnel: the server forwards `127.0.0.1:remote_port` back to us as
/// inbound channels, each piped to a fresh local socket at
/// `127.0.0.1:local_port`.
pub struct ReverseTunnel {
    pub remote_port: u16,
    pub local_port: u16,
}

impl ReverseTunnel {
    /// Request the forward, then hand the forwarded-channel-open stream off
    /// to a background task that spawns one pipe worker per channel (§9's
    /// callback-to-worker translation) and returns once the forward is
    /// established — the accept loop outlives this call and keeps running
    /// for the life of the session, not just this one setup step.
    pub async fn run(self, session: &mut SshSession) -> Result<(), SshError> {
        session.handle.tcpip_forward("127.0.0.1", self.remote_port as u32).await?;
        let local_port = self.local_port;

        let (_idle_tx, idle_rx) = mpsc::unbounded_channel();
        let mut forwarded_channels = std::mem::replace(&mut session.forwarded_channels, idle_rx);
        tokio::spawn(async move {
            while let Some(channel) = forwarded_channels.recv().await {
                tokio::spawn(async move {
                    if let Err(e) = pipe_forwarded_channel(channel, local_port).await {
                        tracing::warn!(error = %e, "forwarded channel pipe ended with an error");
                    }
                });
            }
        });
        Ok(())
    }
}

async fn pipe_forwarded_channel(channel: Channel<client::Msg>, local_port: u16) -> Result<(), SshError> {
    let local = TcpStream::connect(("127.0.0.1", local_port)).await?;
    let remote = channel.into_stream();
    copy_until_close(remote, local).await?;
    Ok(())
}

pub async fn copy_until_close(
    mut a: impl tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
    mut b: impl tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
) -> std::io::Result<()> {
    copy_bidirectional(&mut a, &mut b).await.map(|_| ())
}
