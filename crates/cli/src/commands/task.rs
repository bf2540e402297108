// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `patze task` — read-only listing of scheduled tasks (§3.5, §4.11a).

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::client::DaemonClient;
use crate::output::{print_list, OutputFormat};

#[derive(Args)]
pub struct TaskArgs {
    #[command(subcommand)]
    pub command: TaskCommand,
}

#[derive(Subcommand)]
pub enum TaskCommand {
    /// List scheduled tasks
    List {},
}

pub async fn handle(command: TaskCommand, client: &DaemonClient, format: OutputFormat) -> Result<()> {
    match command {
        TaskCommand::List {} => {
            let tasks = client.list_tasks().await?;
            print_list(format, &tasks, "No scheduled tasks", |t| {
                println!("{:<12} {:<24} {:?}  next={:?}", t.id, t.name, t.status, t.next_run_at);
            })?;
        }
    }
    Ok(())
}
