// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Bridge Command Queue's file (§4.9 persistence, §6.4):
//! `{version:1, commands:[...]}`, atomic write, no backup (queue entries are
//! high-churn; a `.bak` of every mutation would thrash disk for no benefit
//! the task store's rollback story needs).

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use patze_core::BridgeCommand;
use serde::{Deserialize, Serialize};

use crate::atomic::{load_json_or_default, write_atomic, StorageError};

const CURRENT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct CommandFile {
    version: u32,
    commands: Vec<BridgeCommand>,
}

impl Default for CommandFile {
    fn default() -> Self {
        Self { version: CURRENT_VERSION, commands: Vec::new() }
    }
}

/// Load-update-save store for bridge commands. All mutation goes through
/// `save`; there is no partial-update API, matching §5's "command queue
/// file is mutated only through the Store object" rule.
pub struct CommandStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl CommandStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Vec<BridgeCommand> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let file: CommandFile = load_json_or_default(&self.path, CommandFile::default);
        file.commands
    }

    pub fn save(&self, commands: &[BridgeCommand]) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let file = CommandFile { version: CURRENT_VERSION, commands: commands.to_vec() };
        let bytes = serde_json::to_vec_pretty(&file)?;
        write_atomic(&self.path, &bytes, false)
    }
}

#[cfg(test)]
#[path = "command_store_tests.rs"]
mod tests;
