// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The unified frontend snapshot delivered to UI clients (§3.3).
//!
//! This type is the output of the reducer in `patze-engine`; it lives here
//! because `patze-wire` also needs its shape for the `/snapshot` response.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::health::Health;
use crate::machine::Machine;
use crate::run::{Run, RunDetail};
use crate::session::Session;

/// Bound on `logs[]` (§3.3).
pub const MAX_LOGS: usize = 200;
/// Bound on `recentEvents[]` (§3.3).
pub const MAX_RECENT_EVENTS: usize = 50;
/// Ghost-machine pruning window (§3.3).
pub const GHOST_WINDOW_SECS: i64 = 120;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub machine_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    pub line: String,
    pub ts: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentEvent {
    pub event_id: String,
    pub machine_id: String,
    pub ts: DateTime<Utc>,
    /// Fixed-formula one-line summary (e.g. run state `from → to`).
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontendSnapshot {
    pub machines: Vec<Machine>,
    pub sessions: Vec<Session>,
    pub runs: Vec<Run>,
    pub active_runs: Vec<Run>,
    pub health: Health,
    pub run_details: HashMap<String, RunDetail>,
    pub logs: Vec<LogEntry>,
    pub recent_events: Vec<RecentEvent>,
    pub last_updated: DateTime<Utc>,
}

impl FrontendSnapshot {
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            machines: Vec::new(),
            sessions: Vec::new(),
            runs: Vec::new(),
            active_runs: Vec::new(),
            health: Health::default(),
            run_details: HashMap::new(),
            logs: Vec::new(),
            recent_events: Vec::new(),
            last_updated: now,
        }
    }

    pub fn push_log(&mut self, entry: LogEntry) {
        self.logs.push(entry);
        if self.logs.len() > MAX_LOGS {
            let overflow = self.logs.len() - MAX_LOGS;
            self.logs.drain(0..overflow);
        }
    }

    pub fn push_recent_event(&mut self, event: RecentEvent) {
        self.recent_events.push(event);
        if self.recent_events.len() > MAX_RECENT_EVENTS {
            let overflow = self.recent_events.len() - MAX_RECENT_EVENTS;
            self.recent_events.drain(0..overflow);
        }
    }

    /// Apply the sort invariants from §3.3. Call after any mutation that
    /// changes membership or ordering keys.
    pub fn sort_all(&mut self) {
        self.machines.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        let by_updated_then_id = |a: &Run, b: &Run| {
            b.updated_at.cmp(&a.updated_at).then_with(|| a.id.as_str().cmp(b.id.as_str()))
        };
        self.runs.sort_by(by_updated_then_id);
        self.active_runs.sort_by(by_updated_then_id);
        self.sessions.sort_by(|a, b| {
            b.updated_at.cmp(&a.updated_at).then_with(|| a.id.as_str().cmp(b.id.as_str()))
        });
        self.health.machines.sort_by(|a, b| a.machine_id.as_str().cmp(b.machine_id.as_str()));
    }
}
