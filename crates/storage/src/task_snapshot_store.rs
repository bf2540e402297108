// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task snapshot directory (§3.5, §4.11, §6.4): `<snapshotId>.json` per
//! snapshot, used for rollback. Auto snapshots are taken on every
//! create/update/delete; manual ones via the API.

use std::path::PathBuf;

use patze_core::TaskSnapshot;

use crate::atomic::{write_atomic, StorageError};

pub struct TaskSnapshotStore {
    dir: PathBuf,
}

impl TaskSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    pub fn save(&self, snapshot: &TaskSnapshot) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        write_atomic(&self.path_for(snapshot.id.as_str()), &bytes, false)
    }

    pub fn load(&self, id: &str) -> Result<Option<TaskSnapshot>, StorageError> {
        let path = self.path_for(id);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// All snapshots, most recent (`ts`) first.
    pub fn list(&self) -> Result<Vec<TaskSnapshot>, StorageError> {
        let mut out = Vec::new();
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return Ok(out);
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Ok(bytes) = std::fs::read(&path) {
                if let Ok(snapshot) = serde_json::from_slice::<TaskSnapshot>(&bytes) {
                    out.push(snapshot);
                }
            }
        }
        out.sort_by(|a, b| b.ts.cmp(&a.ts));
        Ok(out)
    }
}

#[cfg(test)]
#[path = "task_snapshot_store_tests.rs"]
mod tests;
