// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `known_hosts` parsing, matching, and TOFU pinning (§4.7).
//!
//! Hashed-host entries (`|1|salt|hash`) are recognized as present but never
//! matched — pending a compatible hash oracle, per §9's open question, they
//! are treated as if they pin nothing.

use std::fs;
use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KnownHostsError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownHostsEntry {
    pub patterns: Vec<String>,
    pub algo: String,
    pub key_b64: String,
}

/// `[host]:port` for non-22 ports, bare `host` for port 22 (§4.7).
pub fn host_port_label(host: &str, port: u16) -> String {
    if port == 22 {
        host.to_string()
    } else {
        format!("[{host}]:{port}")
    }
}

/// `*`/`?` glob matcher so host-pattern wildcards don't need a regex crate.
fn wildcard_match(pattern: &str, value: &str) -> bool {
    fn inner(p: &[char], v: &[char]) -> bool {
        match p.first() {
            None => v.is_empty(),
            Some('*') => inner(&p[1..], v) || (!v.is_empty() && inner(p, &v[1..])),
            Some('?') => !v.is_empty() && inner(&p[1..], &v[1..]),
            Some(pc) => v.first() == Some(pc) && inner(&p[1..], &v[1..]),
        }
    }
    inner(&pattern.chars().collect::<Vec<_>>(), &value.chars().collect::<Vec<_>>())
}

fn pattern_matches_host(pattern: &str, host: &str, port: u16) -> bool {
    if pattern.starts_with("|1|") {
        // Hashed-host marker: explicitly non-matching (§9).
        return false;
    }
    if let Some(rest) = pattern.strip_prefix('[') {
        let Some((bracket_host, after)) = rest.split_once(']') else { return false };
        let Some(pattern_port) = after.strip_prefix(':').and_then(|p| p.parse::<u16>().ok()) else {
            return false;
        };
        return pattern_port == port && wildcard_match(bracket_host, host);
    }
    port == 22 && wildcard_match(pattern, host)
}

/// Parse a `known_hosts` file's contents. Malformed/comment/blank lines are
/// skipped.
pub fn parse(content: &str) -> Vec<KnownHostsEntry> {
    content
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            let mut parts = line.splitn(3, ' ');
            let hosts = parts.next()?;
            let algo = parts.next()?;
            let key_b64 = parts.next()?;
            let patterns = hosts.split(',').map(str::to_string).collect();
            Some(KnownHostsEntry { patterns, algo: algo.to_string(), key_b64: key_b64.to_string() })
        })
        .collect()
}

pub fn load(path: &Path) -> Result<Vec<KnownHostsEntry>, KnownHostsError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(parse(&content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

/// Entries whose pattern list matches `(host, port)`.
pub fn matching<'a>(entries: &'a [KnownHostsEntry], host: &str, port: u16) -> Vec<&'a KnownHostsEntry> {
    entries
        .iter()
        .filter(|e| e.patterns.iter().any(|p| pattern_matches_host(p, host, port)))
        .collect()
}

/// Append `<label> <algo> <base64>\n` for a newly trusted key (best-effort;
/// failure must not fail the connection — §5's "known-hosts append is
/// best-effort" rule, so the caller should log and ignore `Err` here).
pub fn append(path: &Path, host: &str, port: u16, algo: &str, key_b64: &str) -> Result<(), KnownHostsError> {
    use std::io::Write;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{} {} {}", host_port_label(host, port), algo, key_b64)?;
    Ok(())
}

/// Outcome of checking a presented host key against `known_hosts` (§4.7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostKeyDecision {
    /// Matched an existing pinned entry.
    Pinned,
    /// No entry existed; accepted under TOFU and a new entry was appended
    /// (best-effort; `appended` is false if the append itself failed).
    TrustedOnFirstUse { appended: bool },
    /// No entry existed and TOFU is disabled.
    RejectedNoTofu,
    /// An entry exists but does not match the presented key.
    RejectedMismatch,
}

/// Verify a presented key against the loaded entries, applying TOFU if
/// requested. Does not mutate `known_hosts` itself — callers persist via
/// [`append`] when the decision is `TrustedOnFirstUse`.
pub fn decide(
    entries: &[KnownHostsEntry],
    host: &str,
    port: u16,
    algo: &str,
    key_b64: &str,
    trust_on_first_use: bool,
) -> HostKeyDecision {
    let matches = matching(entries, host, port);
    if matches.is_empty() {
        if trust_on_first_use {
            HostKeyDecision::TrustedOnFirstUse { appended: false }
        } else {
            HostKeyDecision::RejectedNoTofu
        }
    } else if matches.iter().any(|e| e.algo == algo && e.key_b64 == key_b64) {
        HostKeyDecision::Pinned
    } else {
        HostKeyDecision::RejectedMismatch
    }
}

#[cfg(test)]
#[path = "known_hosts_tests.rs"]
mod tests;
