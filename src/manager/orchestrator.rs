//! The scan orchestrator.

use crate::client::ScanClient;
use crate::core::{FileKind, FileReference, FileState, GateResult, ScanGateError, ScanVerdict};
use crate::manager::in_flight::InFlightSet;
use crate::store::ArcVerdictStore;

/// Runs scans and records their verdicts.
///
/// At most one scan per file locator is in flight within one orchestrator.
/// A concurrent request for the same file is rejected with
/// [`ScanGateError::ScanInProgress`]; sequential requests are always
/// accepted and each appends a new verdict.
#[derive(Debug, Clone)]
pub struct ScanOrchestrator {
    client: ScanClient,
    store: ArcVerdictStore,
    in_flight: InFlightSet,
}

impl ScanOrchestrator {
    /// Creates an orchestrator over a client and a store.
    pub fn new(client: ScanClient, store: ArcVerdictStore) -> Self {
        Self {
            client,
            store,
            in_flight: InFlightSet::new(),
        }
    }

    /// Validates raw request fields and scans the file.
    ///
    /// Empty (or whitespace-only) fields and unknown file kinds are rejected
    /// with `InvalidInput` before any external call.
    pub async fn request_scan(
        &self,
        file_url: &str,
        report_id: &str,
        file_kind: &str,
    ) -> GateResult<ScanVerdict> {
        let file = parse_request(file_url, report_id, file_kind)?;
        self.scan_file(&file).await
    }

    /// Scans a file and appends the resulting verdict.
    ///
    /// A `scan_failed` outcome is recorded and returned like any other
    /// verdict; only input and concurrency violations are errors.
    pub async fn scan_file(&self, file: &FileReference) -> GateResult<ScanVerdict> {
        validate(file)?;

        let Some(_guard) = self.in_flight.try_acquire(&file.file_url) else {
            tracing::debug!(
                file_url = %file.file_url,
                report_id = %file.report_id,
                "Scan rejected, already in flight"
            );
            return Err(ScanGateError::scan_in_progress(&file.file_url));
        };

        crate::audit::emit_scan_requested(file);

        tracing::info!(
            file_url = %file.file_url,
            report_id = %file.report_id,
            file_kind = %file.file_kind,
            service = self.client.service_name(),
            "Starting scan"
        );

        let outcome = self.client.scan(file).await;
        let verdict = ScanVerdict::from_outcome(file, outcome);

        self.store.insert(verdict.clone()).await?;

        tracing::info!(
            file_url = %verdict.file_url,
            verdict = %verdict.verdict,
            threat_count = verdict.detected_threats.len(),
            "Scan completed"
        );

        crate::audit::emit_verdict_recorded(&verdict);

        Ok(verdict)
    }

    /// Returns `true` if a scan of the file is in flight.
    pub fn is_in_flight(&self, file_url: &str) -> bool {
        self.in_flight.contains(file_url)
    }

    /// Returns the in-flight set shared with status readers.
    pub fn in_flight(&self) -> &InFlightSet {
        &self.in_flight
    }

    /// Returns the effective state of a file.
    ///
    /// The recorded state is raised to at least `pending` while a scan is
    /// in flight, so a file under rescan is not served on a stale `clean`.
    pub async fn file_state(&self, file_url: &str) -> GateResult<FileState> {
        let recorded = FileState::from(self.store.current(file_url).await?.map(|v| v.verdict));
        if self.is_in_flight(file_url) {
            Ok(recorded.worse(FileState::Pending))
        } else {
            Ok(recorded)
        }
    }

    /// Returns the verdict store.
    pub fn store(&self) -> &ArcVerdictStore {
        &self.store
    }

    /// Returns the scan client.
    pub fn client(&self) -> &ScanClient {
        &self.client
    }
}

fn parse_request(file_url: &str, report_id: &str, file_kind: &str) -> GateResult<FileReference> {
    if file_kind.trim().is_empty() {
        return Err(ScanGateError::invalid_input("file_kind"));
    }
    let kind = FileKind::parse(file_kind).ok_or_else(|| ScanGateError::invalid_input("file_kind"))?;
    let file = FileReference::new(file_url, report_id, kind);
    validate(&file)?;
    Ok(file)
}

fn validate(file: &FileReference) -> GateResult<()> {
    if file.file_url.trim().is_empty() {
        return Err(ScanGateError::invalid_input("file_url"));
    }
    if file.report_id.trim().is_empty() {
        return Err(ScanGateError::invalid_input("report_id"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{MockBehavior, MockScanService};
    use crate::client::ClientConfig;
    use crate::core::Verdict;
    use crate::store::InMemoryVerdictStore;
    use std::sync::Arc;
    use std::time::Duration;

    fn orchestrator(service: MockScanService) -> ScanOrchestrator {
        let client = ScanClient::new(Arc::new(service), ClientConfig::default());
        ScanOrchestrator::new(client, Arc::new(InMemoryVerdictStore::new()))
    }

    #[tokio::test]
    async fn test_request_scan_records_verdict() {
        let orchestrator = orchestrator(MockScanService::new_clean());

        let verdict = orchestrator.request_scan("f1", "r1", "image").await.unwrap();
        assert_eq!(verdict.verdict, Verdict::Clean);
        assert!(verdict.detected_threats.is_empty());

        let current = orchestrator.store().current("f1").await.unwrap().unwrap();
        assert_eq!(current.id, verdict.id);
        assert!(!orchestrator.is_in_flight("f1"));
    }

    #[tokio::test]
    async fn test_invalid_input_never_calls_service() {
        let service = Arc::new(MockScanService::new_clean());
        let client = ScanClient::new(service.clone(), ClientConfig::default());
        let store = Arc::new(InMemoryVerdictStore::new());
        let orchestrator = ScanOrchestrator::new(client, store.clone());

        let cases = [
            ("", "r1", "image"),
            ("f1", "  ", "image"),
            ("f1", "r1", ""),
            ("f1", "r1", "spreadsheet"),
        ];
        for (url, report, kind) in cases {
            let err = orchestrator.request_scan(url, report, kind).await.unwrap_err();
            assert!(matches!(err, ScanGateError::InvalidInput { .. }));
            assert!(err.is_caller_error());
        }

        let err = orchestrator.request_scan("f1", " ", "image").await.unwrap_err();
        assert!(matches!(err, ScanGateError::InvalidInput { field: "report_id" }));

        assert_eq!(service.scan_count(), 0);
        assert!(store.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_same_file_rejected() {
        let service = MockScanService::new_clean().with_latency(Duration::from_millis(200));
        let orchestrator = orchestrator(service);

        let (a, b) = tokio::join!(
            orchestrator.request_scan("f1", "r1", "image"),
            orchestrator.request_scan("f1", "r1", "image"),
        );

        let results = [a, b];
        let accepted = results.iter().filter(|r| r.is_ok()).count();
        let rejected = results
            .iter()
            .filter(|r| matches!(r, Err(ScanGateError::ScanInProgress { .. })))
            .count();

        assert_eq!(accepted, 1);
        assert_eq!(rejected, 1);
        assert_eq!(orchestrator.store().count("f1").await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_distinct_files_scan_in_parallel() {
        let service = MockScanService::new_clean().with_latency(Duration::from_millis(100));
        let orchestrator = orchestrator(service);

        let (a, b) = tokio::join!(
            orchestrator.request_scan("f1", "r1", "image"),
            orchestrator.request_scan("f2", "r1", "video"),
        );
        assert!(a.is_ok());
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_sequential_scans_append() {
        let service = MockScanService::new().with_sequence(
            "f5",
            vec![MockBehavior::infected(["Eicar"]), MockBehavior::clean()],
        );
        let orchestrator = orchestrator(service);

        let first = orchestrator.request_scan("f5", "r1", "document").await.unwrap();
        let second = orchestrator.request_scan("f5", "r1", "document").await.unwrap();

        assert_eq!(first.verdict, Verdict::Infected);
        assert_eq!(second.verdict, Verdict::Clean);

        let history = orchestrator.store().history("f5").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(
            orchestrator.store().current("f5").await.unwrap().unwrap().verdict,
            Verdict::Clean
        );
    }

    #[tokio::test]
    async fn test_failure_is_recorded() {
        let service = MockScanService::new().with_default_behavior(MockBehavior::ConnectionRefused);
        let orchestrator = orchestrator(service);

        let verdict = orchestrator.request_scan("f1", "r1", "image").await.unwrap();
        assert_eq!(verdict.verdict, Verdict::ScanFailed);
        assert_eq!(orchestrator.store().count("f1").await.unwrap(), 1);
        assert_eq!(
            orchestrator.file_state("f1").await.unwrap(),
            FileState::ScanFailed
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_file_state_pending_while_in_flight() {
        let service = MockScanService::new_clean().with_latency(Duration::from_millis(300));
        let orchestrator = Arc::new(orchestrator(service));

        assert_eq!(
            orchestrator.file_state("f1").await.unwrap(),
            FileState::Unscanned
        );

        let task = {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move { orchestrator.request_scan("f1", "r1", "image").await })
        };

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(
            orchestrator.file_state("f1").await.unwrap(),
            FileState::Pending
        );

        task.await.unwrap().unwrap();
        assert_eq!(orchestrator.file_state("f1").await.unwrap(), FileState::Clean);
    }
}
