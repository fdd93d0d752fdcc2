//! Structured audit logging.
//!
//! This module emits structured audit events through `tracing` under the
//! `scangate::audit` target. Any subscriber (JSON file, OpenTelemetry, a
//! surrounding audit service) can capture them for a durable trail.

mod events;

pub use events::{
    emit_access_denied, emit_scan_requested, emit_threat_detected, emit_verdict_recorded,
    AccessAuditEvent, AuditEvent, VerdictAuditEvent,
};
