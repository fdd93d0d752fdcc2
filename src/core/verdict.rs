//! Scan outcome and verdict record structures.
//!
//! A [`ScanOutcome`] is what the scan client hands back after talking to the
//! scanning service. The orchestrator turns it into a [`ScanVerdict`], the
//! immutable record appended to the verdict store.

use crate::core::types::{FileKind, FileReference, FileState, Verdict};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The result of one call to the scanning service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanOutcome {
    /// What the service concluded.
    pub verdict: Verdict,

    /// Names of detected threats, in service order.
    #[serde(default)]
    pub detected_threats: Vec<String>,

    /// Human-readable message from the service or the client.
    #[serde(default)]
    pub message: String,

    /// Opaque diagnostic payload.
    #[serde(default)]
    pub raw_detail: serde_json::Value,

    /// Identifier of the scanner build or signature database.
    pub scanner_version: String,
}

impl ScanOutcome {
    /// Creates an outcome with the given verdict and no threats.
    pub fn new(verdict: Verdict, scanner_version: impl Into<String>) -> Self {
        Self {
            verdict,
            detected_threats: Vec::new(),
            message: String::new(),
            raw_detail: serde_json::Value::Null,
            scanner_version: scanner_version.into(),
        }
    }

    /// Creates a `scan_failed` outcome carrying the failure message.
    pub fn failed(scanner_version: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::new(Verdict::ScanFailed, scanner_version)
        }
    }

    /// Sets the detected threats.
    pub fn with_threats<I, S>(mut self, threats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.detected_threats = threats.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Sets the raw diagnostic payload.
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.raw_detail = detail;
        self
    }

    /// Returns `true` if the scan failed.
    pub fn is_failed(&self) -> bool {
        self.verdict == Verdict::ScanFailed
    }
}

/// One immutable, recorded scan outcome for one file.
///
/// Records are append-only: a rescan produces a new record and never touches
/// an earlier one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanVerdict {
    /// Unique identifier of this record.
    pub id: String,

    /// File that was scanned.
    pub file_url: String,

    /// Report owning the file.
    pub report_id: String,

    /// Kind of file that was scanned.
    pub file_kind: FileKind,

    /// What the scan concluded.
    pub verdict: Verdict,

    /// Names of detected threats.
    pub detected_threats: Vec<String>,

    /// Scanner build or signature database that produced the verdict.
    pub scanner_version: String,

    /// Message from the service or the client.
    pub message: String,

    /// Opaque diagnostic payload.
    pub raw_detail: serde_json::Value,

    /// When the scan completed.
    pub scanned_at: DateTime<Utc>,
}

impl ScanVerdict {
    /// Builds a record from a scan outcome, stamped with the current time.
    pub fn from_outcome(file: &FileReference, outcome: ScanOutcome) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            file_url: file.file_url.clone(),
            report_id: file.report_id.clone(),
            file_kind: file.file_kind,
            verdict: outcome.verdict,
            detected_threats: outcome.detected_threats,
            scanner_version: outcome.scanner_version,
            message: outcome.message,
            raw_detail: outcome.raw_detail,
            scanned_at: Utc::now(),
        }
    }

    /// Builds a bare record with the given verdict.
    pub fn new(file: &FileReference, verdict: Verdict) -> Self {
        Self::from_outcome(file, ScanOutcome::new(verdict, "unknown"))
    }

    /// Overrides the completion timestamp.
    pub fn with_scanned_at(mut self, scanned_at: DateTime<Utc>) -> Self {
        self.scanned_at = scanned_at;
        self
    }

    /// Sets the detected threats.
    pub fn with_threats<I, S>(mut self, threats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.detected_threats = threats.into_iter().map(Into::into).collect();
        self
    }

    /// Returns the file state this record puts the file in.
    pub fn state(&self) -> FileState {
        self.verdict.into()
    }

    /// Returns `true` if the file was confirmed safe.
    pub fn is_clean(&self) -> bool {
        self.verdict.is_clean()
    }

    /// Returns `true` if this record is evidence of a threat.
    pub fn is_threat(&self) -> bool {
        self.verdict.is_threat()
    }

    /// Number of threats this record contributes to a report's total.
    ///
    /// A threat verdict with no itemized detections still counts as one.
    pub fn threat_weight(&self) -> usize {
        if self.is_threat() {
            self.detected_threats.len().max(1)
        } else {
            0
        }
    }
}
