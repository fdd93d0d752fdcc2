//! Report-level trust status.

mod aggregate;

pub use aggregate::{aggregate, FileStatus, ReportThreatStatus, StatusAggregator};
