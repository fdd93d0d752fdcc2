//! Scanning service implementations.
//!
//! This module contains implementations of the `ScanService` trait.
//!
//! ## Available Backends
//!
//! - [`mock`] - A scriptable in-process service for testing
//! - [`http`] - A remote service reached over HTTP (requires `http` feature)
//!
//! ## Implementing a Custom Backend
//!
//! ```rust,ignore
//! use scangate::core::{ScanRequest, ScanService, ServiceResponse, TransportError};
//! use async_trait::async_trait;
//!
//! #[derive(Debug)]
//! pub struct MyService;
//!
//! #[async_trait]
//! impl ScanService for MyService {
//!     fn name(&self) -> &str {
//!         "my-service"
//!     }
//!
//!     async fn scan(&self, request: &ScanRequest) -> Result<ServiceResponse, TransportError> {
//!         todo!()
//!     }
//!
//!     async fn health_check(&self) -> Result<(), TransportError> {
//!         Ok(())
//!     }
//! }
//! ```

pub mod mock;

#[cfg(feature = "http")]
pub mod http;

pub use mock::{MockBehavior, MockScanService};

#[cfg(feature = "http")]
pub use http::{HttpScanService, HttpServiceConfig};
