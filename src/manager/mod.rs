//! Scan orchestration and the top-level façade.
//!
//! The `ScanOrchestrator` runs one scan per file at a time and records every
//! outcome. `ScanGate` wires the orchestrator, status aggregation, access
//! gating, and threat notifications over one verdict store.

mod in_flight;
mod orchestrator;
mod scan_gate;

pub use in_flight::{InFlightGuard, InFlightSet};
pub use orchestrator::ScanOrchestrator;
pub use scan_gate::{FileScanResult, ScanGate, ScanGateBuilder, ScanGateConfig};
