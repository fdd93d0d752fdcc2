//! # Scangate
//!
//! Malware scanning and fail-closed access gating for report attachments.
//!
//! ## Overview
//!
//! Scangate sits between a store of user-submitted files and the people who
//! review them. It lets you:
//!
//! - Request scans from an external scanning service through a consistent API
//! - Record every outcome in an append-only verdict log
//! - Gate viewing and downloading on a confirmed `clean` verdict
//! - Roll per-file verdicts up into a report-level trust status
//! - Push threat alerts to subscribers and serve a "recent threats" view
//! - Emit structured audit logs for every scan, verdict, and denial
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use scangate::ScanGate;
//! use scangate::backends::MockScanService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gate = ScanGate::builder()
//!         .with_service(MockScanService::new_clean())
//!         .build()?;
//!
//!     let verdict = gate.request_scan("s3://evidence/f1.png", "r1", "image").await?;
//!     println!("verdict: {}", verdict.verdict);
//!
//!     if gate.can_view("s3://evidence/f1.png").await? {
//!         println!("File may be shown");
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `default` - Includes the HTTP backend
//! - `http` - Remote scanning service over HTTP via `reqwest`
//!
//! ## Architecture
//!
//! - **Core**: Verdict vocabulary, records, collaborator traits, errors
//! - **Backends**: Scanning service implementations
//! - **Client**: One bounded call per scan, failures become `scan_failed`
//! - **Store**: Append-only verdict log with a change feed
//! - **Manager**: Per-file in-flight guard, orchestration, and the façade
//! - **Status**: Worst-of aggregation into a report status
//! - **Gate**: Fail-closed view/download decisions
//! - **Notify**: Threat alerts and the recent-threats rollup
//! - **Audit**: Structured logging for compliance

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod audit;
pub mod backends;
pub mod client;
pub mod core;
pub mod gate;
pub mod manager;
pub mod notify;
pub mod status;
pub mod store;

// Re-export commonly used types at the crate root
pub use crate::core::{
    FileKind, FileReference, FileState, GateResult, ScanGateError, ScanOutcome, ScanService,
    ScanVerdict, TransportError, Verdict,
};

pub use crate::client::{ClientConfig, ScanClient};
pub use crate::gate::AccessDecision;
pub use crate::manager::{ScanGate, ScanGateConfig, ScanOrchestrator};
pub use crate::notify::{NotificationBroadcaster, ReportRollup, ThreatNotification};
pub use crate::status::{ReportThreatStatus, StatusAggregator};
pub use crate::store::{InMemoryVerdictStore, VerdictStore};

/// Prelude module for convenient imports.
///
/// ```rust
/// use scangate::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::{
        FileKind, FileReference, FileState, GateResult, ReportFiles, ScanGateError, ScanOutcome,
        ScanService, ScanVerdict, TransportError, Verdict,
    };
    pub use crate::client::{ClientConfig, ScanClient};
    pub use crate::gate::{can_download, can_view, AccessDecision};
    pub use crate::manager::{ScanGate, ScanGateConfig, ScanOrchestrator};
    pub use crate::notify::{NotificationBroadcaster, ReportRollup, ThreatNotification};
    pub use crate::status::{ReportThreatStatus, StatusAggregator};
    pub use crate::store::{InMemoryVerdictStore, VerdictStore};
}
