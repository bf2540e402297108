// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `patze bridge` — setup/list/remove/retry-sudo against the Bridge
//! Lifecycle Manager (§4.8, §4.11a).

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::client::DaemonClient;
use crate::output::{print_list, print_or_json, OutputFormat};

#[derive(Args)]
pub struct BridgeArgs {
    #[command(subcommand)]
    pub command: BridgeCommand,
}

#[derive(Subcommand)]
pub enum BridgeCommand {
    /// List known bridges and their current phase
    List {},
    /// Set up (or re-idempotently resume) a bridge to a remote host
    Setup {
        /// Remote SSH host
        host: String,
        /// Remote SSH port
        #[arg(long, default_value = "22")]
        port: u16,
        /// Remote SSH user
        #[arg(long)]
        user: String,
        /// Path to an SSH identity file
        #[arg(long)]
        identity_file: Option<String>,
        /// Local port for the reverse tunnel
        #[arg(long)]
        local_port: u16,
        /// Remote port for the reverse tunnel
        #[arg(long)]
        remote_port: u16,
    },
    /// Remove a managed bridge
    Remove {
        /// Bridge id, formatted `host:port`
        id: String,
    },
    /// Retry a bridge stuck in `needs_sudo_password`
    RetrySudo {
        /// Bridge id, formatted `host:port`
        id: String,
        /// Sudo password for the remote install step
        #[arg(long)]
        sudo_password: String,
    },
}

pub async fn handle(command: BridgeCommand, client: &DaemonClient, format: OutputFormat) -> Result<()> {
    match command {
        BridgeCommand::List {} => {
            let bridges = client.list_bridges().await?;
            print_list(format, &bridges, "No bridges configured", |b| {
                println!("{:<24} {:?}  {}", b.id, b.phase, b.error.as_deref().unwrap_or(""));
            })?;
        }
        BridgeCommand::Setup { host, port, user, identity_file, local_port, remote_port } => {
            let bridge = client.setup_bridge(host, port, user, identity_file, local_port, remote_port).await?;
            print_or_json(format, &bridge, || println!("{:<24} {:?}", bridge.id, bridge.phase))?;
        }
        BridgeCommand::Remove { id } => {
            client.remove_bridge(&id).await?;
            println!("removed {id}");
        }
        BridgeCommand::RetrySudo { id, sudo_password } => {
            let bridge = client.retry_with_sudo(&id, sudo_password).await?;
            print_or_json(format, &bridge, || println!("{:<24} {:?}", bridge.id, bridge.phase))?;
        }
    }
    Ok(())
}
