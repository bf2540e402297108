// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! patze-core: domain types for the patze control plane.
//!
//! Telemetry envelope shape (§3.1), read models (§3.2), the frontend
//! snapshot (§3.3), bridge commands (§3.4), scheduled tasks (§3.5), and the
//! bridge lifecycle phases (§4.8). Validation logic that needs store state
//! (dedup, ordering) lives in `patze-engine`; this crate only defines the
//! types and the pure, state-free invariants.

pub mod macros;

pub mod bridge;
pub mod clock;
pub mod command;
pub mod frontend_snapshot;
pub mod health;
pub mod id;
pub mod machine;
pub mod run;
pub mod session;
pub mod task;
pub mod telemetry;

pub use bridge::{BridgeAddr, BridgePhase};
pub use clock::{now_utc, Clock, FakeClock, SystemClock};
pub use command::{
    BridgeCommand, CommandId, CommandIntent, CommandResult, CommandSnapshot, CommandState,
    ResultStatus,
};
pub use frontend_snapshot::{FrontendSnapshot, LogEntry, RecentEvent};
pub use health::{Health, HealthStatus, MachineHealth};
pub use id::short;
pub use machine::{Machine, MachineKind, MachineStatus, ResourceSnapshot};
pub use run::{ModelUsage, Run, RunDetail, RunId, ToolCall};
pub use session::{AgentId, LifecycleState, Session, SessionId};
pub use task::{
    Schedule, ScheduledTask, SnapshotSource, TaskId, TaskRun, TaskRunOutcome, TaskSnapshot,
    TaskSnapshotId, TaskStatus,
};
pub use telemetry::{
    check_id_field, check_payload_shape, Envelope, EventId, EventType, MachineId, Severity,
    TraceContext, TraceId, ValidationError, MAX_ID_LEN, MAX_PAYLOAD_BYTES, TELEMETRY_VERSION,
};
