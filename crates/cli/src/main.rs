// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `patze`: admin CLI for the control plane's bridge/command/task surface
//! (SPEC_FULL §4.11a). Talks to `patzed` over HTTP.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use client::DaemonClient;
use commands::{bridge, command, task};
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "patze", version, about = "Admin CLI for the patze control plane")]
struct Cli {
    /// Base URL of the control plane
    #[arg(long, env = "PATZE_PLANE_URL", default_value = "http://127.0.0.1:8737")]
    plane_url: String,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage SSH bridges to remote hosts
    Bridge(bridge::BridgeArgs),
    /// Manage bridge commands
    Command(command::CommandArgs),
    /// Manage scheduled tasks
    Task(task::TaskArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = DaemonClient::new(cli.plane_url);

    match cli.command {
        Command::Bridge(args) => bridge::handle(args.command, &client, cli.output).await,
        Command::Command(args) => command::handle(args.command, &client, cli.output).await,
        Command::Task(args) => task::handle(args.command, &client, cli.output).await,
    }
}
