//! Error types for the scangate library.
//!
//! Two layers of errors exist:
//!
//! - [`ScanGateError`] is what callers of the public operations see. Only
//!   caller-side contract violations (`InvalidInput`, `ScanInProgress`) and
//!   infrastructure faults of the surrounding system are surfaced.
//! - [`TransportError`] describes why a call to the scanning service failed.
//!   It never crosses the library boundary: the scan client converts it into a
//!   recorded `scan_failed` verdict.

use std::time::Duration;
use thiserror::Error;

/// The main error type for scangate operations.
#[derive(Debug, Error)]
pub enum ScanGateError {
    /// A required request field was empty or outside its vocabulary.
    #[error("invalid input: '{field}' is empty or not recognised")]
    InvalidInput {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A scan for this file is already running on this orchestrator.
    #[error("scan already in progress for '{file_url}'")]
    ScanInProgress {
        /// File locator that is being scanned.
        file_url: String,
    },

    /// The verdict store rejected a read or write.
    #[error("verdict store error: {message}")]
    Store {
        /// Description of the store failure.
        message: String,
    },

    /// The report subsystem could not list a report's files.
    #[error("failed to list files for report '{report_id}': {reason}")]
    ReportLookup {
        /// Report that was looked up.
        report_id: String,
        /// Reason given by the report subsystem.
        reason: String,
    },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },
}

impl ScanGateError {
    /// Returns `true` if the error is a caller-side contract violation.
    ///
    /// `ScanInProgress` callers should wait and retry rather than escalate.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::InvalidInput { .. } | Self::ScanInProgress { .. })
    }

    /// Returns the file locator if this error is associated with one.
    pub fn file_url(&self) -> Option<&str> {
        match self {
            Self::ScanInProgress { file_url } => Some(file_url),
            _ => None,
        }
    }

    /// Creates an `InvalidInput` error.
    pub fn invalid_input(field: &'static str) -> Self {
        Self::InvalidInput { field }
    }

    /// Creates a `ScanInProgress` error.
    pub fn scan_in_progress(file_url: impl Into<String>) -> Self {
        Self::ScanInProgress {
            file_url: file_url.into(),
        }
    }

    /// Creates a `Store` error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Creates a `ReportLookup` error.
    pub fn report_lookup(report_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ReportLookup {
            report_id: report_id.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `Configuration` error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

/// Failure modes of a single call to the scanning service.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The call did not complete within the configured bound.
    #[error("scan timed out after {elapsed:?} on service '{service}'")]
    Timeout {
        /// Name of the service that timed out.
        service: String,
        /// How long the call ran before it was abandoned.
        elapsed: Duration,
    },

    /// The service could not be reached.
    #[error("connection to service '{service}' failed: {message}")]
    ConnectionFailed {
        /// Name of the service.
        service: String,
        /// Error message describing the failure.
        message: String,
    },

    /// The service answered with a non-success status.
    #[error("service '{service}' returned status {status}")]
    Status {
        /// Name of the service.
        service: String,
        /// HTTP or protocol status code.
        status: u16,
    },

    /// The service asked us to slow down.
    #[error("rate limit exceeded for service '{service}': retry after {retry_after:?}")]
    RateLimited {
        /// Name of the service.
        service: String,
        /// Suggested wait time before retry.
        retry_after: Option<Duration>,
    },

    /// The response body could not be understood.
    #[error("malformed response from service '{service}': {details}")]
    MalformedResponse {
        /// Name of the service.
        service: String,
        /// Details about what could not be parsed.
        details: String,
    },
}

impl TransportError {
    /// Returns `true` if a later attempt could plausibly succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::ConnectionFailed { .. } | Self::RateLimited { .. }
        )
    }

    /// Returns the name of the service involved.
    pub fn service(&self) -> &str {
        match self {
            Self::Timeout { service, .. }
            | Self::ConnectionFailed { service, .. }
            | Self::Status { service, .. }
            | Self::RateLimited { service, .. }
            | Self::MalformedResponse { service, .. } => service,
        }
    }

    /// Creates a `Timeout` error.
    pub fn timeout(service: impl Into<String>, elapsed: Duration) -> Self {
        Self::Timeout {
            service: service.into(),
            elapsed,
        }
    }

    /// Creates a `ConnectionFailed` error.
    pub fn connection_failed(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Creates a `MalformedResponse` error.
    pub fn malformed(service: impl Into<String>, details: impl Into<String>) -> Self {
        Self::MalformedResponse {
            service: service.into(),
            details: details.into(),
        }
    }
}

/// A specialized `Result` type for scangate operations.
pub type GateResult<T> = Result<T, ScanGateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_errors() {
        assert!(ScanGateError::invalid_input("file_url").is_caller_error());
        assert!(ScanGateError::scan_in_progress("s3://a").is_caller_error());
        assert!(!ScanGateError::store("disk full").is_caller_error());
    }

    #[test]
    fn test_scan_in_progress_file_url() {
        let err = ScanGateError::scan_in_progress("s3://bucket/f1.png");
        assert_eq!(err.file_url(), Some("s3://bucket/f1.png"));
        assert_eq!(ScanGateError::invalid_input("report_id").file_url(), None);
    }

    #[test]
    fn test_transport_error_recoverable() {
        let timeout = TransportError::timeout("remote", Duration::from_secs(30));
        assert!(timeout.is_recoverable());
        assert_eq!(timeout.service(), "remote");

        let malformed = TransportError::malformed("remote", "missing verdict");
        assert!(!malformed.is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let err = ScanGateError::invalid_input("file_kind");
        assert!(err.to_string().contains("file_kind"));

        let err = TransportError::Status {
            service: "remote".into(),
            status: 503,
        };
        assert!(err.to_string().contains("503"));
    }
}
