// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-to-tmp-then-rename, with an optional single `.bak` of the previous
//! file (§4.11 step 1-3). A concurrent reader of `path` never observes
//! partial content: it sees either the old file or the new one, never a mix.

use std::fs;
use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write `bytes` to `path` atomically. When `backup` is set and `path`
/// already exists, the previous content is copied to `path.bak` first.
pub fn write_atomic(path: &Path, bytes: &[u8], backup: bool) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    if backup && path.exists() {
        let bak = path.with_extension(append_ext(path, "bak"));
        fs::copy(path, bak)?;
    }

    let tmp = path.with_extension(append_ext(path, "tmp"));
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn append_ext(path: &Path, ext: &str) -> String {
    match path.extension().and_then(|e| e.to_str()) {
        Some(existing) => format!("{existing}.{ext}"),
        None => ext.to_string(),
    }
}

/// Load and parse a JSON file, tolerating an absent or corrupt file by
/// returning `default` (§4.11 loader tolerance rule).
pub fn load_json_or_default<T>(path: &Path, default: impl FnOnce() -> T) -> T
where
    T: serde::de::DeserializeOwned,
{
    match fs::read(path) {
        Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "corrupt state file, using default");
            default()
        }),
        Err(_) => default(),
    }
}

#[cfg(test)]
#[path = "atomic_tests.rs"]
mod tests;
