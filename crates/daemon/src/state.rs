// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared application state: every long-lived component the HTTP layer
//! reaches into, wired together once at startup (§2, §5).

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use patze_core::clock::{now_utc, SystemClock};
use patze_core::{FrontendSnapshot, ScheduledTask};
use patze_engine::{CommandQueue, ProjectorState, ReduceCtx};
use patze_storage::{CommandStore, TaskSnapshotStore, TaskStore};

use crate::bridge_registry::{self, Bridges, ConfigResolver};
use crate::env;
use crate::http::cron_sync::CronSyncState;

/// Everything the HTTP handlers and the background tasks share. Cloned
/// cheaply (an `Arc` around the real guts) per axum's `with_state` idiom.
#[derive(Clone)]
pub struct AppState(Arc<Inner>);

struct Inner {
    pub event_store: patze_engine::EventStore,
    pub projector: Mutex<ProjectorState>,
    pub snapshot: Mutex<FrontendSnapshot>,
    pub command_queue: CommandQueue<SystemClock>,
    pub task_store: TaskStore,
    pub task_snapshot_store: TaskSnapshotStore,
    pub tasks: Mutex<Vec<ScheduledTask>>,
    pub clock: SystemClock,
    pub last_upstream_activity: Mutex<Instant>,
    pub bridges: Bridges,
    pub cron_sync: CronSyncState,
}

impl AppState {
    pub fn load() -> Result<Self, patze_storage::StorageError> {
        let command_store = CommandStore::new(env::command_store_path());
        let command_queue = CommandQueue::new(command_store, SystemClock);

        let task_store = TaskStore::new(env::task_store_path(), env::task_history_path());
        let tasks = task_store.load();

        let task_snapshot_store = TaskSnapshotStore::new(env::task_snapshot_dir());

        Ok(Self(Arc::new(Inner {
            event_store: patze_engine::EventStore::new(env::event_store_capacity()),
            projector: Mutex::new(ProjectorState::new()),
            snapshot: Mutex::new(FrontendSnapshot::empty()),
            command_queue,
            task_store,
            task_snapshot_store,
            tasks: Mutex::new(tasks),
            clock: SystemClock,
            last_upstream_activity: Mutex::new(Instant::now()),
            bridges: bridge_registry::new_bridge_manager(),
            cron_sync: CronSyncState::new(),
        })))
    }

    pub fn bridges(&self) -> &Bridges {
        &self.0.bridges
    }

    pub fn cron_sync(&self) -> &CronSyncState {
        &self.0.cron_sync
    }

    /// The per-bridge connection config (`SshTarget`, tunnel ports) backing
    /// `bridges()`'s `RemoteOps`, so `POST /bridge/setup` can register a
    /// target before handing the id to the lifecycle manager.
    pub fn bridges_config(&self) -> &ConfigResolver {
        self.0.bridges.ops().resolver()
    }

    pub fn event_store(&self) -> &patze_engine::EventStore {
        &self.0.event_store
    }

    pub fn command_queue(&self) -> &CommandQueue<SystemClock> {
        &self.0.command_queue
    }

    pub fn task_store(&self) -> &TaskStore {
        &self.0.task_store
    }

    pub fn task_snapshot_store(&self) -> &TaskSnapshotStore {
        &self.0.task_snapshot_store
    }

    pub fn tasks(&self) -> Vec<ScheduledTask> {
        self.0.tasks.lock().clone()
    }

    pub fn replace_tasks(&self, tasks: Vec<ScheduledTask>) {
        *self.0.tasks.lock() = tasks;
    }

    pub fn touch_upstream(&self) {
        *self.0.last_upstream_activity.lock() = Instant::now();
    }

    pub fn upstream_stale(&self) -> bool {
        self.0.last_upstream_activity.lock().elapsed() > env::stream_degraded_after()
    }

    /// Fold one validated envelope into the projector, then the reducer, in
    /// that order — the reducer reads the projector's *post*-mutation state
    /// for everything except the previous-snapshot summary inputs it needs
    /// from `prev` (§4.3).
    pub fn apply_event(&self, event: &patze_core::Envelope) {
        self.touch_upstream();
        let mut projector = self.0.projector.lock();
        projector.apply(event);

        let mut snapshot = self.0.snapshot.lock();
        let ctx = ReduceCtx::new(now_utc(&self.0.clock));
        *snapshot = patze_engine::reduce(&snapshot, &projector, event, &ctx);
    }

    pub fn current_snapshot(&self) -> FrontendSnapshot {
        let mut snapshot = self.0.snapshot.lock().clone();
        if self.upstream_stale() {
            snapshot.health.mark_stream_degraded();
        }
        snapshot
    }

    /// Persist the task set and take an automatic rollback snapshot,
    /// tagged `auto` (§4.11).
    pub fn save_tasks_with_auto_snapshot(
        &self,
        tasks: Vec<ScheduledTask>,
        description: impl Into<String>,
    ) -> Result<(), patze_storage::StorageError> {
        self.task_store().save(&tasks)?;
        let snapshot = patze_core::TaskSnapshot {
            id: patze_core::TaskSnapshotId::new(),
            ts: now_utc(&self.0.clock),
            source: patze_core::SnapshotSource::Auto,
            description: description.into(),
            tasks: tasks.clone(),
        };
        self.task_snapshot_store().save(&snapshot)?;
        self.replace_tasks(tasks);
        Ok(())
    }
}
