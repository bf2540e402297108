// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared `--output text|json` rendering for every subcommand.

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Render `value` as pretty JSON when `format` is `Json`; otherwise run
/// `text` to print the human-readable form.
pub fn print_or_json<T: Serialize>(format: OutputFormat, value: &T, text: impl FnOnce()) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => text(),
    }
    Ok(())
}

/// Render a list, printing `empty_message` in text mode when it has no rows.
pub fn print_list<T: Serialize>(format: OutputFormat, items: &[T], empty_message: &str, mut row: impl FnMut(&T)) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(items)?),
        OutputFormat::Text => {
            if items.is_empty() {
                println!("{empty_message}");
            } else {
                for item in items {
                    row(item);
                }
            }
        }
    }
    Ok(())
}
