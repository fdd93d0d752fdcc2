//! Core types and traits for the scangate library.
//!
//! - [`types`] - Closed vocabularies: `Verdict`, `FileState`, `FileKind`
//! - [`verdict`] - `ScanOutcome` and the immutable `ScanVerdict` record
//! - [`traits`] - The `ScanService` and `ReportFiles` collaborator traits
//! - [`error`] - Structured error types

pub mod error;
pub mod traits;
pub mod types;
pub mod verdict;

pub use error::{GateResult, ScanGateError, TransportError};
pub use traits::{
    ArcReportFiles, ArcScanService, ReportFiles, ScanRequest, ScanService, ServiceResponse,
    StaticReportFiles,
};
pub use types::{BadgeTone, FileKind, FileReference, FileState, Verdict};
pub use verdict::{ScanOutcome, ScanVerdict};
