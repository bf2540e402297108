// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Field-by-field validation of a raw telemetry envelope (§4.1).
//!
//! `Envelope` derives a strict `Deserialize`; feeding it malformed wire
//! input directly (a bad timestamp string, an unknown severity) would fail
//! generic deserialization before any of the distinct `{code, message}`
//! rejection reasons could be attributed. This module parses the raw
//! `serde_json::Value` field by field instead, so every rejection carries
//! the precise code from §4.1, then hands the result to
//! `Envelope::validate_shape` for the remaining structural rules.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use patze_core::{check_id_field, Envelope, EventId, EventType, MachineId, Severity, TraceContext, ValidationError, TELEMETRY_VERSION};

pub fn validate_and_parse(raw: &Value) -> Result<Envelope, ValidationError> {
    let obj = raw
        .as_object()
        .ok_or_else(|| ValidationError::InvalidEnvelope("envelope must be a JSON object".into()))?;

    let version = require_str(obj, "version")?;
    if version != TELEMETRY_VERSION {
        return Err(ValidationError::InvalidSchemaVersion(version.to_string()));
    }

    let id_raw = require_str(obj, "id")?;
    check_id_field("id", id_raw)?;

    let ts_raw = require_str(obj, "ts")?;
    let ts: DateTime<Utc> = DateTime::parse_from_rfc3339(ts_raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ValidationError::InvalidTimestamp(e.to_string()))?;

    let machine_id_raw = obj.get("machineId").and_then(Value::as_str).unwrap_or("");
    if machine_id_raw.is_empty() {
        return Err(ValidationError::MissingMachineId);
    }
    check_id_field("machineId", machine_id_raw)?;

    let severity_raw = require_str(obj, "severity")?;
    let severity: Severity = serde_json::from_value(Value::String(severity_raw.to_string()))
        .map_err(|_| ValidationError::InvalidSeverity(severity_raw.to_string()))?;

    let type_raw = require_str(obj, "type")?;
    let event_type: EventType = serde_json::from_value(Value::String(type_raw.to_string()))
        .map_err(|_| ValidationError::InvalidEventType(type_raw.to_string()))?;

    let trace_raw = obj.get("trace").cloned().unwrap_or(Value::Null);
    let trace: TraceContext =
        serde_json::from_value(trace_raw).map_err(|e| ValidationError::InvalidTrace(e.to_string()))?;

    let payload = obj
        .get("payload")
        .cloned()
        .ok_or_else(|| ValidationError::InvalidPayload("missing payload".into()))?;

    let envelope = Envelope {
        version: version.to_string(),
        id: EventId::new(id_raw),
        ts,
        machine_id: MachineId::new(machine_id_raw),
        severity,
        event_type,
        payload,
        trace,
    };

    envelope.validate_shape()?;
    Ok(envelope)
}

fn require_str<'a>(obj: &'a Map<String, Value>, field: &str) -> Result<&'a str, ValidationError> {
    obj.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| ValidationError::InvalidEnvelope(format!("missing or non-string field {field:?}")))
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
