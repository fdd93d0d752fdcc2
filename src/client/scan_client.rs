//! The scan client implementation.

use crate::core::{
    ArcScanService, FileReference, ScanOutcome, ScanRequest, ServiceResponse, TransportError,
    Verdict,
};

use std::sync::Arc;
use std::time::{Duration, Instant};

/// Detail key a service may use to report its scanner version.
const SCANNER_VERSION_KEY: &str = "scannerVersion";

/// Configuration for the scan client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Upper bound on a single call to the scanning service.
    pub scan_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            scan_timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    /// Creates a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the scan timeout.
    pub fn with_scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = timeout;
        self
    }
}

/// Invokes the scanning service for one file at a time.
///
/// The client never retries and never writes verdicts; both are caller
/// decisions.
#[derive(Debug, Clone)]
pub struct ScanClient {
    service: ArcScanService,
    config: ClientConfig,
}

impl ScanClient {
    /// Creates a client over the given service.
    pub fn new(service: ArcScanService, config: ClientConfig) -> Self {
        Self { service, config }
    }

    /// Creates a client with default configuration.
    pub fn with_defaults<S: crate::core::ScanService + 'static>(service: S) -> Self {
        Self::new(Arc::new(service), ClientConfig::default())
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the name of the underlying service.
    pub fn service_name(&self) -> &str {
        self.service.name()
    }

    /// Probes the underlying service, bounded by the scan timeout.
    pub async fn health_check(&self) -> Result<(), TransportError> {
        match tokio::time::timeout(self.config.scan_timeout, self.service.health_check()).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::timeout(
                self.service.name(),
                self.config.scan_timeout,
            )),
        }
    }

    /// Scans one file.
    ///
    /// Always returns an outcome: timeouts, transport failures, malformed
    /// bodies, and unrecognised verdicts all become `scan_failed`.
    pub async fn scan(&self, file: &FileReference) -> ScanOutcome {
        let request = ScanRequest::from(file);
        let start = Instant::now();

        let result =
            tokio::time::timeout(self.config.scan_timeout, self.service.scan(&request)).await;

        let outcome = match result {
            Ok(Ok(response)) => self.interpret(response),
            Ok(Err(e)) => {
                tracing::warn!(
                    service = self.service.name(),
                    file_url = %file.file_url,
                    error = %e,
                    recoverable = e.is_recoverable(),
                    "Scanning service call failed"
                );
                ScanOutcome::failed(self.service.name(), e.to_string())
            }
            Err(_) => {
                tracing::warn!(
                    service = self.service.name(),
                    file_url = %file.file_url,
                    timeout_ms = self.config.scan_timeout.as_millis() as u64,
                    "Scanning service call timed out"
                );
                ScanOutcome::failed(
                    self.service.name(),
                    format!(
                        "scan timed out after {:?} on service '{}'",
                        self.config.scan_timeout,
                        self.service.name()
                    ),
                )
            }
        };

        tracing::debug!(
            service = self.service.name(),
            file_url = %file.file_url,
            verdict = %outcome.verdict,
            duration_ms = start.elapsed().as_millis() as u64,
            "Scan call finished"
        );

        outcome
    }

    /// Converts a raw service response into an outcome.
    fn interpret(&self, response: ServiceResponse) -> ScanOutcome {
        let scanner_version = response
            .detail
            .get(SCANNER_VERSION_KEY)
            .and_then(|v| v.as_str())
            .unwrap_or_else(|| self.service.name())
            .to_string();

        match Verdict::from_wire(&response.verdict) {
            Some(verdict) => ScanOutcome::new(verdict, scanner_version)
                .with_threats(response.threats)
                .with_message(response.message)
                .with_detail(response.detail),
            None => {
                tracing::warn!(
                    service = self.service.name(),
                    raw_verdict = %response.verdict,
                    "Unrecognised verdict from scanning service"
                );
                let mut message = format!("unrecognized verdict '{}'", response.verdict);
                if !response.message.is_empty() {
                    message.push_str(": ");
                    message.push_str(&response.message);
                }
                ScanOutcome::failed(scanner_version, message).with_detail(response.detail)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{MockBehavior, MockScanService};
    use crate::core::FileKind;

    fn file(url: &str) -> FileReference {
        FileReference::new(url, "r1", FileKind::Document)
    }

    #[tokio::test]
    async fn test_clean_response() {
        let client = ScanClient::with_defaults(MockScanService::new_clean());
        let outcome = client.scan(&file("f1")).await;

        assert_eq!(outcome.verdict, Verdict::Clean);
        assert!(outcome.detected_threats.is_empty());
        assert_eq!(outcome.scanner_version, "mock");
    }

    #[tokio::test]
    async fn test_infected_response_keeps_threats() {
        let client = ScanClient::with_defaults(MockScanService::new_infected([
            "Win.Trojan.Agent",
            "Doc.Macro.Dropper",
        ]));
        let outcome = client.scan(&file("f1")).await;

        assert_eq!(outcome.verdict, Verdict::Infected);
        assert_eq!(
            outcome.detected_threats,
            vec!["Win.Trojan.Agent", "Doc.Macro.Dropper"]
        );
    }

    #[tokio::test]
    async fn test_unknown_verdict_is_scan_failed() {
        let service = MockScanService::new().with_default_behavior(MockBehavior::Respond(
            ServiceResponse::new("quarantined").with_message("held for review"),
        ));
        let client = ScanClient::with_defaults(service);
        let outcome = client.scan(&file("f1")).await;

        assert_eq!(outcome.verdict, Verdict::ScanFailed);
        assert!(outcome.message.contains("quarantined"));
        assert!(outcome.message.contains("held for review"));
    }

    #[tokio::test]
    async fn test_transport_failure_is_scan_failed() {
        let service =
            MockScanService::new().with_default_behavior(MockBehavior::ConnectionRefused);
        let client = ScanClient::with_defaults(service);
        let outcome = client.scan(&file("f1")).await;

        assert_eq!(outcome.verdict, Verdict::ScanFailed);
        assert!(outcome.message.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_malformed_is_scan_failed() {
        let service = MockScanService::new()
            .with_default_behavior(MockBehavior::Malformed("unexpected EOF".into()));
        let client = ScanClient::with_defaults(service);

        assert_eq!(client.scan(&file("f1")).await.verdict, Verdict::ScanFailed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_scan_failed() {
        let service = MockScanService::new().with_default_behavior(MockBehavior::Hang);
        let client = ScanClient::new(
            Arc::new(service),
            ClientConfig::new().with_scan_timeout(Duration::from_secs(5)),
        );
        let outcome = client.scan(&file("f4")).await;

        assert_eq!(outcome.verdict, Verdict::ScanFailed);
        assert!(outcome.message.contains("timed out"));
    }

    #[tokio::test]
    async fn test_scanner_version_from_detail() {
        let service = MockScanService::new().with_default_behavior(MockBehavior::Respond(
            ServiceResponse::new("clean")
                .with_detail(serde_json::json!({ "scannerVersion": "clamav-1.3.1/27400" })),
        ));
        let client = ScanClient::with_defaults(service);

        assert_eq!(
            client.scan(&file("f1")).await.scanner_version,
            "clamav-1.3.1/27400"
        );
    }
}
