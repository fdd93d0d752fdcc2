//! Scan client for the external scanning service.
//!
//! The `ScanClient` performs exactly one bounded call per scan and converts
//! every transport or protocol failure into a `scan_failed` outcome, so no
//! raw network error ever crosses the library boundary.

mod scan_client;

pub use scan_client::{ClientConfig, ScanClient};
