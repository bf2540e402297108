// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `patze command` — list/approve/reject against the Bridge Command Queue
//! (§4.9, §4.11a). Commands are created by the control plane's own job
//! logic; the CLI only lists and arbitrates pending approvals.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::client::DaemonClient;
use crate::output::{print_list, print_or_json, OutputFormat};

#[derive(Args)]
pub struct CommandArgs {
    #[command(subcommand)]
    pub command: CommandCommand,
}

#[derive(Subcommand)]
pub enum CommandCommand {
    /// List recent bridge commands
    List {
        /// Maximum number of commands to show
        #[arg(short = 'n', long, default_value = "100")]
        limit: usize,
    },
    /// Approve a command that is queued and awaiting approval
    Approve {
        /// Command id
        id: String,
        /// Target id the approval is scoped to
        #[arg(long)]
        target_id: String,
        /// Target version the approval is scoped to
        #[arg(long)]
        target_version: String,
        /// Who is approving
        #[arg(long)]
        approved_by: String,
    },
    /// Reject a pending command
    Reject {
        /// Command id
        id: String,
        /// Reason, recorded on the command record
        #[arg(long)]
        reason: String,
    },
}

pub async fn handle(command: CommandCommand, client: &DaemonClient, format: OutputFormat) -> Result<()> {
    match command {
        CommandCommand::List { limit } => {
            let commands = client.list_commands(limit).await?;
            print_list(format, &commands, "No commands", |c| {
                println!("{:<16} {:?}  {}", c.id, c.state, c.snapshot.target_id);
            })?;
        }
        CommandCommand::Approve { id, target_id, target_version, approved_by } => {
            match client.approve_command(&id, target_id, target_version, approved_by).await? {
                Some(cmd) => print_or_json(format, &cmd, || println!("{:<16} {:?}", cmd.id, cmd.state))?,
                None => anyhow::bail!("command not found or not eligible for approval: {id}"),
            }
        }
        CommandCommand::Reject { id, reason } => match client.reject_command(&id, reason).await? {
            Some(cmd) => print_or_json(format, &cmd, || println!("{:<16} {:?}", cmd.id, cmd.state))?,
            None => anyhow::bail!("command not found or already terminal: {id}"),
        },
    }
    Ok(())
}
