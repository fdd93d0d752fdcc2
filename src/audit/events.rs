//! Audit event types and emission functions.

use crate::core::{FileReference, FileState, ScanVerdict};
use crate::gate::AccessDecision;
use crate::notify::ThreatNotification;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Base trait for audit events.
pub trait AuditEvent: Serialize {
    /// Returns the event type name.
    fn event_type(&self) -> &'static str;

    /// Returns the timestamp of the event.
    fn timestamp(&self) -> DateTime<Utc>;
}

/// Audit event for a recorded verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerdictAuditEvent {
    /// Timestamp of the event.
    pub timestamp: DateTime<Utc>,

    /// Verdict record ID.
    pub verdict_id: String,

    /// Scanned file.
    pub file_url: String,

    /// Owning report.
    pub report_id: String,

    /// Recorded verdict.
    pub verdict: String,

    /// Detected threat names.
    pub threats: Vec<String>,

    /// Scanner that produced the verdict.
    pub scanner_version: String,

    /// Service or client message.
    pub message: String,
}

impl From<&ScanVerdict> for VerdictAuditEvent {
    fn from(v: &ScanVerdict) -> Self {
        Self {
            timestamp: v.scanned_at,
            verdict_id: v.id.clone(),
            file_url: v.file_url.clone(),
            report_id: v.report_id.clone(),
            verdict: v.verdict.to_string(),
            threats: v.detected_threats.clone(),
            scanner_version: v.scanner_version.clone(),
            message: v.message.clone(),
        }
    }
}

impl AuditEvent for VerdictAuditEvent {
    fn event_type(&self) -> &'static str {
        "verdict_recorded"
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Audit event for a denied view or download.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessAuditEvent {
    /// Timestamp of the event.
    pub timestamp: DateTime<Utc>,

    /// File that was requested.
    pub file_url: String,

    /// State of the file at decision time.
    pub state: FileState,

    /// Reason for the denial.
    pub reason: String,
}

impl AuditEvent for AccessAuditEvent {
    fn event_type(&self) -> &'static str {
        "access_denied"
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Emits an audit event for a scan being dispatched.
pub fn emit_scan_requested(file: &FileReference) {
    tracing::info!(
        target: "scangate::audit",
        event_type = "scan_requested",
        file_url = %file.file_url,
        report_id = %file.report_id,
        file_kind = %file.file_kind,
        "Scan requested"
    );
}

/// Emits an audit event for a verdict appended to the store.
pub fn emit_verdict_recorded(verdict: &ScanVerdict) {
    let event = VerdictAuditEvent::from(verdict);

    tracing::info!(
        target: "scangate::audit",
        event_type = event.event_type(),
        verdict_id = %event.verdict_id,
        file_url = %event.file_url,
        report_id = %event.report_id,
        verdict = %event.verdict,
        threats = ?event.threats,
        threat_count = event.threats.len(),
        scanner_version = %event.scanner_version,
        message = %event.message,
        scanned_at = %event.timestamp,
        "Verdict recorded"
    );
}

/// Emits an audit event for a threat alert.
pub fn emit_threat_detected(notification: &ThreatNotification) {
    tracing::warn!(
        target: "scangate::audit",
        event_type = "threat_detected",
        report_id = %notification.report_id,
        file_url = %notification.file_url,
        verdict = %notification.verdict,
        threat_detail_count = notification.threat_detail_count,
        occurred_at = %notification.occurred_at,
        "Threat detected"
    );
}

/// Emits an audit event for a denied access request.
pub fn emit_access_denied(file_url: &str, decision: &AccessDecision) {
    let event = AccessAuditEvent {
        timestamp: Utc::now(),
        file_url: file_url.to_string(),
        state: decision.state,
        reason: decision.denial_reason().unwrap_or_default().to_string(),
    };

    tracing::info!(
        target: "scangate::audit",
        event_type = event.event_type(),
        file_url = %event.file_url,
        state = %event.state,
        reason = %event.reason,
        "Access denied"
    );
}
