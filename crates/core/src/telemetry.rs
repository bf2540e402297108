// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The telemetry envelope: the canonical shape every event from a bridge
//! must match before it is allowed into the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::define_string_id;

/// Schema version every envelope must carry.
pub const TELEMETRY_VERSION: &str = "telemetry.v1";

/// Envelopes larger than this (payload only, serialized) are rejected.
pub const MAX_PAYLOAD_BYTES: usize = 512 * 1024;

/// Opaque IDs and strings carried by the envelope are capped at this length.
pub const MAX_ID_LEN: usize = 256;

define_string_id! {
    /// Stable identity of the host emitting telemetry.
    pub struct MachineId;
}

define_string_id! {
    /// Opaque event identifier, unique per machine. The `(machineId, id)`
    /// pair is the dedup key.
    pub struct EventId;
}

define_string_id! {
    /// Distributed trace identifier, opaque to us.
    pub struct TraceId;
}

define_string_id! {
    /// Distributed trace span identifier, opaque to us.
    pub struct SpanId;
}

/// Severity carried by every event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
    Critical,
}

/// Closed set of telemetry event types (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventType {
    #[serde(rename = "machine.registered")]
    MachineRegistered,
    #[serde(rename = "machine.heartbeat")]
    MachineHeartbeat,
    #[serde(rename = "agent.state.changed")]
    AgentStateChanged,
    #[serde(rename = "session.state.changed")]
    SessionStateChanged,
    #[serde(rename = "run.state.changed")]
    RunStateChanged,
    #[serde(rename = "run.log.emitted")]
    RunLogEmitted,
    #[serde(rename = "run.tool.started")]
    RunToolStarted,
    #[serde(rename = "run.tool.completed")]
    RunToolCompleted,
    #[serde(rename = "run.model.usage")]
    RunModelUsage,
    #[serde(rename = "run.resource.usage")]
    RunResourceUsage,
    #[serde(rename = "trace.span.recorded")]
    TraceSpanRecorded,
}

impl EventType {
    /// True for the event type excluded from `recentEvents` (§3.3).
    pub fn is_heartbeat(self) -> bool {
        matches!(self, EventType::MachineHeartbeat)
    }
}

/// Minimal distributed-trace context attached to an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceContext {
    pub trace_id: TraceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span_id: Option<SpanId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<SpanId>,
}

/// A validated telemetry envelope (§3.1). Immutable once constructed; the
/// store never mutates a stored envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub version: String,
    pub id: EventId,
    pub ts: DateTime<Utc>,
    pub machine_id: MachineId,
    pub severity: Severity,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub payload: Value,
    pub trace: TraceContext,
}

/// One rejection reason per validation rule in §4.1, each a distinct
/// `code` in the `{code, message}` body returned to the caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid_envelope: {0}")]
    InvalidEnvelope(String),
    #[error("invalid_payload: {0}")]
    InvalidPayload(String),
    #[error("invalid_schema_version: expected {TELEMETRY_VERSION}, got {0}")]
    InvalidSchemaVersion(String),
    #[error("invalid_event_type: {0}")]
    InvalidEventType(String),
    #[error("missing_machine_id")]
    MissingMachineId,
    #[error("invalid_timestamp: {0}")]
    InvalidTimestamp(String),
    #[error("invalid_severity: {0}")]
    InvalidSeverity(String),
    #[error("invalid_trace: {0}")]
    InvalidTrace(String),
}

impl ValidationError {
    /// The stable `code` string surfaced in the rejection body.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::InvalidEnvelope(_) => "invalid_envelope",
            ValidationError::InvalidPayload(_) => "invalid_payload",
            ValidationError::InvalidSchemaVersion(_) => "invalid_schema_version",
            ValidationError::InvalidEventType(_) => "invalid_event_type",
            ValidationError::MissingMachineId => "missing_machine_id",
            ValidationError::InvalidTimestamp(_) => "invalid_timestamp",
            ValidationError::InvalidSeverity(_) => "invalid_severity",
            ValidationError::InvalidTrace(_) => "invalid_trace",
        }
    }
}

/// Shared by `validate_shape` and the raw-JSON validator in `patze-engine`.
pub fn check_id_field(name: &str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::InvalidEnvelope(format!("{name} must not be empty")));
    }
    if value.len() > MAX_ID_LEN {
        return Err(ValidationError::InvalidEnvelope(format!(
            "{name} exceeds {MAX_ID_LEN} chars"
        )));
    }
    if value.contains('\n') || value.contains('\r') {
        return Err(ValidationError::InvalidEnvelope(format!("{name} must not contain newlines")));
    }
    Ok(())
}

/// Required numeric/string fields for each event type's payload (§4.1 rule 6).
pub fn check_payload_shape(event_type: EventType, payload: &Value) -> Result<(), ValidationError> {
    let obj = payload.as_object().ok_or_else(|| {
        ValidationError::InvalidPayload(format!("{event_type:?} payload must be an object"))
    })?;

    let require = |fields: &[&str]| -> Result<(), ValidationError> {
        for f in fields {
            if !obj.contains_key(*f) {
                return Err(ValidationError::InvalidPayload(format!(
                    "{event_type:?} payload missing field {f:?}"
                )));
            }
        }
        Ok(())
    };

    match event_type {
        EventType::MachineRegistered => require(&["status"]),
        EventType::MachineHeartbeat => {
            let resource = obj.get("resource").and_then(Value::as_object).ok_or_else(|| {
                ValidationError::InvalidPayload("heartbeat payload missing resource".into())
            })?;
            for f in ["cpuPct", "memoryBytes", "memoryPct"] {
                if !resource.contains_key(f) {
                    return Err(ValidationError::InvalidPayload(format!(
                        "heartbeat resource missing field {f:?}"
                    )));
                }
            }
            Ok(())
        }
        EventType::AgentStateChanged => require(&["agentId", "state"]),
        EventType::SessionStateChanged => require(&["sessionId", "state"]),
        EventType::RunStateChanged => require(&["runId", "sessionId", "state"]),
        EventType::RunLogEmitted => require(&["runId", "line"]),
        EventType::RunToolStarted => require(&["runId", "toolCallId", "name"]),
        EventType::RunToolCompleted => require(&["runId", "toolCallId"]),
        EventType::RunModelUsage => require(&["runId", "provider", "model", "inputTokens", "outputTokens"]),
        EventType::RunResourceUsage => require(&["runId"]),
        EventType::TraceSpanRecorded => require(&["name"]),
    }
}

impl Envelope {
    /// Pure shape validation (§4.1 rules 1–7). Does not consult the store,
    /// so it carries no dedup/ordering knowledge — that lives in
    /// `patze-engine`'s validator.
    pub fn validate_shape(&self) -> Result<(), ValidationError> {
        if self.version != TELEMETRY_VERSION {
            return Err(ValidationError::InvalidSchemaVersion(self.version.clone()));
        }
        check_id_field("id", self.id.as_str())?;
        check_id_field("machineId", self.machine_id.as_str())?;

        if self.machine_id.as_str().is_empty() {
            return Err(ValidationError::MissingMachineId);
        }

        if self.trace.trace_id.as_str().is_empty() {
            return Err(ValidationError::InvalidTrace("traceId must not be empty".into()));
        }

        if let Some(payload_machine_id) = self.payload.get("machineId").and_then(Value::as_str) {
            if payload_machine_id != self.machine_id.as_str() {
                return Err(ValidationError::InvalidPayload(
                    "payload.machineId does not match envelope machineId".into(),
                ));
            }
        }

        check_payload_shape(self.event_type, &self.payload)?;

        let size = serde_json::to_vec(&self.payload)
            .map_err(|e| ValidationError::InvalidPayload(e.to_string()))?
            .len();
        if size > MAX_PAYLOAD_BYTES {
            return Err(ValidationError::InvalidPayload(format!(
                "payload is {size} bytes, exceeds {MAX_PAYLOAD_BYTES}"
            )));
        }

        Ok(())
    }

    /// The `(machineId, id)` dedup key.
    pub fn dedup_key(&self) -> (String, String) {
        (self.machine_id.as_str().to_string(), self.id.as_str().to_string())
    }
}

#[cfg(test)]
#[path = "telemetry_tests.rs"]
mod tests;
