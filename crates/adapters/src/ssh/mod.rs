// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SSH transport, host-key trust, and alias resolution (§4.7).

pub mod auth;
pub mod known_hosts;
pub mod transport;

pub use auth::{resolve_ssh_alias, enforce_key_under_ssh_dir, AuthError, SshTarget};
pub use known_hosts::{decide, HostKeyDecision, KnownHostsError};
pub use transport::{ReverseTunnel, SshError, SshSession};
