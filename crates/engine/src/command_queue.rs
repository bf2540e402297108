// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The bridge command lease machine (§4.9): an in-memory mirror of the
//! command file, mutated only through `load → update → save` so every
//! transition is atomically persisted alongside the in-memory state.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use thiserror::Error;

use patze_core::{
    now_utc, BridgeCommand, Clock, CommandId, CommandResult, CommandSnapshot, CommandState,
    MachineId, ResultStatus,
};
use patze_storage::{CommandStore, StorageError};

/// Dead-letter threshold shared by lease and execution attempt counts (§4.9).
const MAX_ATTEMPTS: u32 = 3;

/// Cap on `list()`'s result size regardless of the caller's requested limit.
const LIST_MAX: usize = 500;

#[derive(Debug, Error)]
pub enum CommandQueueError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Lease-based work queue over persisted `BridgeCommand` records. Lease
/// contention and ownership mismatches are silent no-ops (`Ok(None)`), not
/// errors (§7 item 7) — only I/O failures surface as `Err`.
pub struct CommandQueue<C: Clock> {
    store: CommandStore,
    commands: Mutex<Vec<BridgeCommand>>,
    clock: C,
}

impl<C: Clock> CommandQueue<C> {
    pub fn new(store: CommandStore, clock: C) -> Self {
        let commands = store.load();
        Self { store, commands: Mutex::new(commands), clock }
    }

    fn persist(&self, commands: &[BridgeCommand]) -> Result<(), CommandQueueError> {
        self.store.save(commands)?;
        Ok(())
    }

    pub fn create(&self, snapshot: CommandSnapshot) -> Result<BridgeCommand, CommandQueueError> {
        let now = now_utc(&self.clock);
        let command = BridgeCommand::new(now, snapshot);
        let mut commands = self.commands.lock();
        commands.push(command.clone());
        self.persist(&commands)?;
        Ok(command)
    }

    pub fn approve(
        &self,
        command_id: &str,
        target_id: &str,
        target_version: &str,
        approved_by: &str,
    ) -> Result<Option<BridgeCommand>, CommandQueueError> {
        let now = now_utc(&self.clock);
        let mut commands = self.commands.lock();
        let Some(cmd) = commands.iter_mut().find(|c| c.id.as_str() == command_id) else {
            return Ok(None);
        };
        if cmd.state.is_terminal()
            || !cmd.snapshot.approval_required
            || cmd.snapshot.target_id != target_id
            || cmd.snapshot.target_version != target_version
        {
            return Ok(None);
        }
        cmd.approved_at = Some(now);
        cmd.approved_by = Some(approved_by.to_string());
        cmd.updated_at = now;
        let result = cmd.clone();
        self.persist(&commands)?;
        Ok(Some(result))
    }

    pub fn reject(&self, command_id: &str, reason: &str) -> Result<Option<BridgeCommand>, CommandQueueError> {
        let now = now_utc(&self.clock);
        let mut commands = self.commands.lock();
        let Some(cmd) = commands.iter_mut().find(|c| c.id.as_str() == command_id) else {
            return Ok(None);
        };
        if cmd.state.is_terminal() {
            return Ok(None);
        }
        cmd.state = CommandState::Rejected;
        cmd.rejected_reason = Some(reason.to_string());
        cmd.updated_at = now;
        let result = cmd.clone();
        self.persist(&commands)?;
        Ok(Some(result))
    }

    /// Expire overdue leases (§4.9), called at the head of `poll`.
    fn expire_leases(commands: &mut [BridgeCommand], now: DateTime<Utc>) {
        for cmd in commands.iter_mut() {
            if !matches!(cmd.state, CommandState::Leased | CommandState::Running) {
                continue;
            }
            let Some(lease_until) = cmd.lease_until else { continue };
            if lease_until > now {
                continue;
            }
            cmd.state = if cmd.execution_attempts >= MAX_ATTEMPTS || cmd.lease_attempts >= MAX_ATTEMPTS {
                CommandState::Deadletter
            } else {
                CommandState::Expired
            };
            cmd.lease_owner_machine_id = None;
            cmd.lease_until = None;
            cmd.updated_at = now;
        }
    }

    pub fn poll(&self, machine_id: &str, lease_ttl_ms: u64) -> Result<Option<BridgeCommand>, CommandQueueError> {
        let now = now_utc(&self.clock);
        let mut commands = self.commands.lock();
        Self::expire_leases(&mut commands, now);

        let idx = commands
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_pollable_for(machine_id))
            .min_by_key(|(_, c)| c.created_at)
            .map(|(i, _)| i);

        let result = idx.map(|i| {
            let cmd = &mut commands[i];
            cmd.state = CommandState::Leased;
            cmd.lease_owner_machine_id = Some(MachineId::new(machine_id));
            cmd.lease_until = Some(now + Duration::milliseconds(lease_ttl_ms as i64));
            cmd.lease_attempts += 1;
            cmd.updated_at = now;
            cmd.clone()
        });

        self.persist(&commands)?;
        Ok(result)
    }

    fn owned_mut<'a>(
        commands: &'a mut [BridgeCommand],
        command_id: &str,
        machine_id: &str,
    ) -> Option<&'a mut BridgeCommand> {
        commands.iter_mut().find(|c| {
            c.id.as_str() == command_id
                && c.lease_owner_machine_id.as_ref().map(MachineId::as_str) == Some(machine_id)
                && matches!(c.state, CommandState::Leased | CommandState::Running)
        })
    }

    pub fn ack_running(&self, command_id: &str, machine_id: &str) -> Result<Option<BridgeCommand>, CommandQueueError> {
        let now = now_utc(&self.clock);
        let mut commands = self.commands.lock();
        let Some(cmd) = Self::owned_mut(&mut commands, command_id, machine_id) else { return Ok(None) };
        if cmd.state == CommandState::Leased {
            cmd.state = CommandState::Running;
            cmd.execution_attempts += 1;
            cmd.updated_at = now;
        }
        let result = cmd.clone();
        self.persist(&commands)?;
        Ok(Some(result))
    }

    pub fn renew_lease(
        &self,
        command_id: &str,
        machine_id: &str,
        lease_ttl_ms: u64,
    ) -> Result<Option<BridgeCommand>, CommandQueueError> {
        let now = now_utc(&self.clock);
        let mut commands = self.commands.lock();
        let Some(cmd) = Self::owned_mut(&mut commands, command_id, machine_id) else { return Ok(None) };
        cmd.lease_until = Some(now + Duration::milliseconds(lease_ttl_ms as i64));
        cmd.updated_at = now;
        let result = cmd.clone();
        self.persist(&commands)?;
        Ok(Some(result))
    }

    pub fn push_result(
        &self,
        command_id: &str,
        machine_id: &str,
        result: CommandResult,
    ) -> Result<Option<BridgeCommand>, CommandQueueError> {
        let now = now_utc(&self.clock);
        let mut commands = self.commands.lock();
        let Some(cmd) = Self::owned_mut(&mut commands, command_id, machine_id) else { return Ok(None) };
        cmd.state = match result.status {
            ResultStatus::Succeeded => CommandState::Succeeded,
            ResultStatus::Failed => CommandState::Failed,
        };
        cmd.result = Some(result);
        cmd.lease_owner_machine_id = None;
        cmd.lease_until = None;
        cmd.updated_at = now;
        let out = cmd.clone();
        self.persist(&commands)?;
        Ok(Some(out))
    }

    pub fn get(&self, command_id: &CommandId) -> Option<BridgeCommand> {
        self.commands.lock().iter().find(|c| &c.id == command_id).cloned()
    }

    /// Records sorted by `createdAt` DESC, capped at 500 regardless of `limit`.
    pub fn list(&self, limit: usize) -> Vec<BridgeCommand> {
        let mut commands = self.commands.lock().clone();
        commands.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        commands.truncate(limit.min(LIST_MAX));
        commands
    }
}

#[cfg(test)]
#[path = "command_queue_tests.rs"]
mod tests;
