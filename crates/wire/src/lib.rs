// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire-level DTOs for the HTTP boundary.
//!
//! Everything in here is `camelCase` JSON shape, matching the external
//! contract; nothing in here carries invariants. Domain types in
//! `patze_core` are converted to/from these at the HTTP handler layer only.

pub mod commands;
pub mod error;
pub mod ingest;
pub mod snapshot;
pub mod sse;
pub mod tasks;

pub use commands::{
    BridgeCommandDto, CommandIntentDto, CommandResultDto, CommandSnapshotDto, CreateCommandRequest,
};
pub use error::ErrorBody;
pub use ingest::{
    BridgeConnectionDto, CronSyncRequest, CronSyncResponse, IngestBatchRequest, IngestBatchResponse,
    PreflightRequest, PreflightResponse, RejectedEvent,
};
pub use snapshot::{
    FrontendSnapshotDto, HealthDto, LogEntryDto, MachineDto, RecentEventDto, RunDetailDto, RunDto,
    SessionDto,
};
pub use tasks::{ScheduledTaskDto, TaskSnapshotDto};
