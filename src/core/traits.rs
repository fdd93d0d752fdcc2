//! Core traits for the scangate library.
//!
//! - [`ScanService`] is implemented by every transport to an external
//!   scanning service (HTTP, in-process mock, ...).
//! - [`ReportFiles`] is implemented by the report subsystem that owns the
//!   list of files attached to each report.

use crate::core::error::{ScanGateError, TransportError};
use crate::core::types::{FileKind, FileReference};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::RwLock;

/// Request sent to the scanning service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    /// Locator of the file to scan.
    #[serde(rename = "fileURL")]
    pub file_url: String,

    /// Report owning the file.
    #[serde(rename = "reportID")]
    pub report_id: String,

    /// Kind of file.
    #[serde(rename = "fileKind")]
    pub file_kind: FileKind,
}

impl From<&FileReference> for ScanRequest {
    fn from(file: &FileReference) -> Self {
        Self {
            file_url: file.file_url.clone(),
            report_id: file.report_id.clone(),
            file_kind: file.file_kind,
        }
    }
}

/// Response body returned by the scanning service.
///
/// `verdict` is kept as a raw string: the service vocabulary may grow, and
/// interpreting it is the scan client's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceResponse {
    /// Raw verdict string.
    pub verdict: String,

    /// Names of detected threats.
    #[serde(default)]
    pub threats: Vec<String>,

    /// Human-readable message.
    #[serde(default)]
    pub message: String,

    /// Opaque diagnostic object.
    #[serde(default)]
    pub detail: serde_json::Value,
}

impl ServiceResponse {
    /// Creates a response with the given raw verdict.
    pub fn new(verdict: impl Into<String>) -> Self {
        Self {
            verdict: verdict.into(),
            threats: Vec::new(),
            message: String::new(),
            detail: serde_json::Value::Null,
        }
    }

    /// Sets the detected threats.
    pub fn with_threats<I, S>(mut self, threats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.threats = threats.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Sets the diagnostic object.
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = detail;
        self
    }
}

/// A transport to an external content-scanning service.
///
/// Implementations perform exactly one call per `scan` and never retry;
/// bounding the call in time is the scan client's responsibility.
#[async_trait]
pub trait ScanService: Send + Sync + Debug {
    /// Returns the name of this service.
    ///
    /// Used as the scanner version when the service does not report one.
    fn name(&self) -> &str;

    /// Submits one file for scanning and returns the raw response.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` when the service cannot be reached, answers
    /// with a non-success status, or returns a body that does not decode.
    async fn scan(&self, request: &ScanRequest) -> Result<ServiceResponse, TransportError>;

    /// Performs a lightweight reachability check.
    async fn health_check(&self) -> Result<(), TransportError>;
}

/// The report subsystem's view of which files belong to a report.
#[async_trait]
pub trait ReportFiles: Send + Sync + Debug {
    /// Lists the files attached to a report.
    ///
    /// An unknown report has no files.
    async fn list_file_references(
        &self,
        report_id: &str,
    ) -> Result<Vec<FileReference>, ScanGateError>;
}

/// An in-memory report file listing.
///
/// Useful for tests and for embedding the library where report evidence
/// lists are already materialized.
#[derive(Debug, Default)]
pub struct StaticReportFiles {
    reports: RwLock<HashMap<String, Vec<FileReference>>>,
}

impl StaticReportFiles {
    /// Creates an empty listing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file to its report.
    pub fn with_file(self, file: FileReference) -> Self {
        self.add_file(file);
        self
    }

    /// Adds a file to its report (shared-reference version).
    pub fn add_file(&self, file: FileReference) {
        self.reports
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .entry(file.report_id.clone())
            .or_default()
            .push(file);
    }
}

#[async_trait]
impl ReportFiles for StaticReportFiles {
    async fn list_file_references(
        &self,
        report_id: &str,
    ) -> Result<Vec<FileReference>, ScanGateError> {
        Ok(self
            .reports
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(report_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// An arc-wrapped scanning service for shared ownership.
pub type ArcScanService = std::sync::Arc<dyn ScanService>;

/// An arc-wrapped report file listing for shared ownership.
pub type ArcReportFiles = std::sync::Arc<dyn ReportFiles>;
