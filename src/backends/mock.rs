//! Mock scanning service for testing.
//!
//! The mock can be scripted per file locator, including sequences of
//! behaviors for rescans, simulated latency, hangs, and transport failures.

use crate::core::{ScanRequest, ScanService, ServiceResponse, TransportError};

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;

/// What the mock does when asked to scan a file.
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Answer with this response.
    Respond(ServiceResponse),
    /// Fail as if the connection was refused.
    ConnectionRefused,
    /// Answer with a body that cannot be decoded.
    Malformed(String),
    /// Never answer.
    Hang,
}

impl MockBehavior {
    /// Answer `clean` with no threats.
    pub fn clean() -> Self {
        Self::Respond(ServiceResponse::new("clean"))
    }

    /// Answer `infected` with the given threats.
    pub fn infected<I, S>(threats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Respond(ServiceResponse::new("infected").with_threats(threats))
    }

    /// Answer `suspicious` with the given threats.
    pub fn suspicious<I, S>(threats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Respond(ServiceResponse::new("suspicious").with_threats(threats))
    }

    /// Answer with an arbitrary raw verdict string.
    pub fn verdict(raw: impl Into<String>) -> Self {
        Self::Respond(ServiceResponse::new(raw))
    }
}

/// A mock scanning service for testing purposes.
///
/// # Examples
///
/// ```rust
/// use scangate::backends::{MockBehavior, MockScanService};
/// use std::time::Duration;
///
/// // Every file is clean
/// let service = MockScanService::new_clean();
///
/// // One file is infected on the first scan and clean on the rescan
/// let service = MockScanService::new()
///     .with_sequence("s3://evidence/f5.pdf", vec![
///         MockBehavior::infected(["Trojan.Generic"]),
///         MockBehavior::clean(),
///     ])
///     .with_latency(Duration::from_millis(20));
/// ```
#[derive(Debug)]
pub struct MockScanService {
    /// Name of this service instance.
    name: String,
    /// Scripted behaviors keyed by file locator.
    scripts: RwLock<HashMap<String, VecDeque<MockBehavior>>>,
    /// Behavior for files without a script.
    default_behavior: MockBehavior,
    /// Simulated latency for scans.
    latency: Option<Duration>,
    /// Counter for scan operations.
    scan_count: AtomicU64,
    /// Whether to fail health checks.
    unhealthy: RwLock<bool>,
}

impl MockScanService {
    /// Creates a new mock service that reports every file clean.
    pub fn new() -> Self {
        Self {
            name: "mock".to_string(),
            scripts: RwLock::new(HashMap::new()),
            default_behavior: MockBehavior::clean(),
            latency: None,
            scan_count: AtomicU64::new(0),
            unhealthy: RwLock::new(false),
        }
    }

    /// Creates a mock service that always reports clean.
    pub fn new_clean() -> Self {
        Self::new()
    }

    /// Creates a mock service that always reports infected.
    pub fn new_infected<I, S>(threats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new().with_default_behavior(MockBehavior::infected(threats))
    }

    /// Sets the name of this service.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the behavior for files without a script.
    pub fn with_default_behavior(mut self, behavior: MockBehavior) -> Self {
        self.default_behavior = behavior;
        self
    }

    /// Scripts a single behavior for a file.
    pub fn with_behavior(self, file_url: impl Into<String>, behavior: MockBehavior) -> Self {
        self.set_behavior(file_url, behavior);
        self
    }

    /// Scripts successive behaviors for a file; the last one repeats.
    pub fn with_sequence(self, file_url: impl Into<String>, behaviors: Vec<MockBehavior>) -> Self {
        self.scripts
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(file_url.into(), behaviors.into());
        self
    }

    /// Sets the simulated latency for scans.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Scripts a single behavior for a file (shared-reference version).
    pub fn set_behavior(&self, file_url: impl Into<String>, behavior: MockBehavior) {
        self.scripts
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(file_url.into(), VecDeque::from([behavior]));
    }

    /// Returns the number of scans performed.
    pub fn scan_count(&self) -> u64 {
        self.scan_count.load(Ordering::Relaxed)
    }

    /// Sets the health status.
    pub fn set_healthy(&self, healthy: bool) {
        *self
            .unhealthy
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = !healthy;
    }

    fn next_behavior(&self, file_url: &str) -> MockBehavior {
        let mut scripts = self
            .scripts
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        match scripts.get_mut(file_url) {
            Some(queue) if queue.len() > 1 => queue
                .pop_front()
                .unwrap_or_else(|| self.default_behavior.clone()),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or_else(|| self.default_behavior.clone()),
            None => self.default_behavior.clone(),
        }
    }
}

impl Default for MockScanService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScanService for MockScanService {
    fn name(&self) -> &str {
        &self.name
    }

    async fn scan(&self, request: &ScanRequest) -> Result<ServiceResponse, TransportError> {
        self.scan_count.fetch_add(1, Ordering::Relaxed);
        let behavior = self.next_behavior(&request.file_url);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match behavior {
            MockBehavior::Respond(response) => Ok(response),
            MockBehavior::ConnectionRefused => Err(TransportError::connection_failed(
                &self.name,
                "connection refused",
            )),
            MockBehavior::Malformed(details) => Err(TransportError::malformed(&self.name, details)),
            MockBehavior::Hang => {
                std::future::pending::<Result<ServiceResponse, TransportError>>().await
            }
        }
    }

    async fn health_check(&self) -> Result<(), TransportError> {
        if *self
            .unhealthy
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
        {
            return Err(TransportError::connection_failed(
                &self.name,
                "mock service is unhealthy",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FileKind;

    fn request(file_url: &str) -> ScanRequest {
        ScanRequest {
            file_url: file_url.to_string(),
            report_id: "r1".to_string(),
            file_kind: FileKind::Image,
        }
    }

    #[tokio::test]
    async fn test_mock_clean() {
        let service = MockScanService::new_clean();
        let response = service.scan(&request("f1")).await.unwrap();
        assert_eq!(response.verdict, "clean");
        assert_eq!(service.scan_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_infected() {
        let service = MockScanService::new_infected(["Win.Trojan.Agent"]);
        let response = service.scan(&request("f1")).await.unwrap();
        assert_eq!(response.verdict, "infected");
        assert_eq!(response.threats, vec!["Win.Trojan.Agent"]);
    }

    #[tokio::test]
    async fn test_mock_sequence_repeats_last() {
        let service = MockScanService::new().with_sequence(
            "f5",
            vec![MockBehavior::infected(["x"]), MockBehavior::clean()],
        );

        assert_eq!(service.scan(&request("f5")).await.unwrap().verdict, "infected");
        assert_eq!(service.scan(&request("f5")).await.unwrap().verdict, "clean");
        assert_eq!(service.scan(&request("f5")).await.unwrap().verdict, "clean");
        // Unscripted files use the default
        assert_eq!(service.scan(&request("f6")).await.unwrap().verdict, "clean");
    }

    #[tokio::test]
    async fn test_mock_failures() {
        let service = MockScanService::new()
            .with_behavior("down", MockBehavior::ConnectionRefused)
            .with_behavior("garbled", MockBehavior::Malformed("not json".into()));

        assert!(matches!(
            service.scan(&request("down")).await,
            Err(TransportError::ConnectionFailed { .. })
        ));
        assert!(matches!(
            service.scan(&request("garbled")).await,
            Err(TransportError::MalformedResponse { .. })
        ));
    }

    #[tokio::test]
    async fn test_mock_health_check() {
        let service = MockScanService::new();
        assert!(service.health_check().await.is_ok());

        service.set_healthy(false);
        assert!(service.health_check().await.is_err());

        service.set_healthy(true);
        assert!(service.health_check().await.is_ok());
    }
}
