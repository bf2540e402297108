// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The scheduled-task store (§3.5, §4.11, §6.4): `{version:1, tasks:[...]}`
//! plus a size-capped JSONL run-history log kept separately so the main
//! task file stays small and is not rewritten on every completed run.

use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use patze_core::ScheduledTask;
use serde::{Deserialize, Serialize};

use crate::atomic::{load_json_or_default, write_atomic, StorageError};

const CURRENT_VERSION: u32 = 1;

/// Run-history lines beyond this count are trimmed from the front on append.
const MAX_HISTORY_LINES: usize = 10_000;

#[derive(Debug, Serialize, Deserialize)]
struct TaskFile {
    version: u32,
    tasks: Vec<ScheduledTask>,
}

impl Default for TaskFile {
    fn default() -> Self {
        Self { version: CURRENT_VERSION, tasks: Vec::new() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunHistoryRecord {
    pub task_id: String,
    pub run: patze_core::TaskRun,
}

pub struct TaskStore {
    path: PathBuf,
    history_path: PathBuf,
    lock: Mutex<()>,
}

impl TaskStore {
    pub fn new(path: impl Into<PathBuf>, history_path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), history_path: history_path.into(), lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Vec<ScheduledTask> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let file: TaskFile = load_json_or_default(&self.path, TaskFile::default);
        file.tasks
    }

    /// Back up the previous file on every save (§4.11 step 2: "for task
    /// store"), since task-set mutations are rare and rollback-sensitive.
    pub fn save(&self, tasks: &[ScheduledTask]) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let file = TaskFile { version: CURRENT_VERSION, tasks: tasks.to_vec() };
        let bytes = serde_json::to_vec_pretty(&file)?;
        write_atomic(&self.path, &bytes, true)
    }

    /// Append one run-history record, trimming the oldest lines if the log
    /// has grown past `MAX_HISTORY_LINES`.
    pub fn append_run_history(&self, record: &RunHistoryRecord) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let line = serde_json::to_string(record)?;

        if let Some(parent) = self.history_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.history_path)?;
        writeln!(file, "{line}")?;
        drop(file);

        self.trim_history_if_needed()?;
        Ok(())
    }

    fn trim_history_if_needed(&self) -> Result<(), StorageError> {
        let Ok(content) = std::fs::read_to_string(&self.history_path) else {
            return Ok(());
        };
        let lines: Vec<&str> = content.lines().collect();
        if lines.len() <= MAX_HISTORY_LINES {
            return Ok(());
        }
        let overflow = lines.len() - MAX_HISTORY_LINES;
        let trimmed = lines[overflow..].join("\n") + "\n";
        write_atomic(&self.history_path, trimmed.as_bytes(), false)
    }
}

#[cfg(test)]
#[path = "task_store_tests.rs"]
mod tests;
