//! The scan gate façade.

use crate::client::{ClientConfig, ScanClient};
use crate::core::{
    ArcReportFiles, ArcScanService, FileReference, FileState, GateResult, ReportFiles,
    ScanGateError, ScanService, ScanVerdict, StaticReportFiles, TransportError,
};
use crate::gate::AccessDecision;
use crate::manager::orchestrator::ScanOrchestrator;
use crate::notify::{BroadcasterConfig, NotificationBroadcaster, ReportRollup, ThreatSubscription};
use crate::status::{ReportThreatStatus, StatusAggregator};
use crate::store::{ArcVerdictStore, InMemoryVerdictStore, StoreConfig, VerdictStore};

use futures::future::join_all;
use std::sync::Arc;

/// Configuration for the scan gate.
#[derive(Debug, Clone, Default)]
pub struct ScanGateConfig {
    /// Scan client configuration.
    pub client: ClientConfig,

    /// Configuration for the default in-memory store.
    ///
    /// Ignored when a store is supplied to the builder.
    pub store: StoreConfig,

    /// Notification broadcaster configuration.
    pub broadcaster: BroadcasterConfig,
}

impl ScanGateConfig {
    /// Creates a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the scan client configuration.
    pub fn with_client(mut self, client: ClientConfig) -> Self {
        self.client = client;
        self
    }

    /// Sets the default store configuration.
    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }

    /// Sets the broadcaster configuration.
    pub fn with_broadcaster(mut self, broadcaster: BroadcasterConfig) -> Self {
        self.broadcaster = broadcaster;
        self
    }
}

/// Builder for creating a `ScanGate`.
pub struct ScanGateBuilder {
    service: Option<ArcScanService>,
    store: Option<ArcVerdictStore>,
    reports: Option<ArcReportFiles>,
    config: ScanGateConfig,
}

impl ScanGateBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            service: None,
            store: None,
            reports: None,
            config: ScanGateConfig::default(),
        }
    }

    /// Sets the scanning service.
    pub fn with_service<S: ScanService + 'static>(mut self, service: S) -> Self {
        self.service = Some(Arc::new(service));
        self
    }

    /// Sets the scanning service wrapped in an Arc.
    pub fn with_arc_service(mut self, service: ArcScanService) -> Self {
        self.service = Some(service);
        self
    }

    /// Sets the verdict store.
    ///
    /// Defaults to an [`InMemoryVerdictStore`].
    pub fn with_store<V: VerdictStore + 'static>(mut self, store: V) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Sets the verdict store wrapped in an Arc.
    pub fn with_arc_store(mut self, store: ArcVerdictStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the report file listing.
    ///
    /// Defaults to an empty [`StaticReportFiles`].
    pub fn with_report_files<R: ReportFiles + 'static>(mut self, reports: R) -> Self {
        self.reports = Some(Arc::new(reports));
        self
    }

    /// Sets the report file listing wrapped in an Arc.
    pub fn with_arc_report_files(mut self, reports: ArcReportFiles) -> Self {
        self.reports = Some(reports);
        self
    }

    /// Sets the configuration.
    pub fn with_config(mut self, config: ScanGateConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the scan gate.
    ///
    /// Must be called from within a tokio runtime, since the notification
    /// broadcaster starts following the store immediately.
    pub fn build(self) -> GateResult<ScanGate> {
        let service = self
            .service
            .ok_or_else(|| ScanGateError::configuration("A scanning service is required"))?;

        let store = self.store.unwrap_or_else(|| {
            Arc::new(InMemoryVerdictStore::with_config(self.config.store.clone()))
        });
        let reports = self
            .reports
            .unwrap_or_else(|| Arc::new(StaticReportFiles::new()));

        let client = ScanClient::new(service, self.config.client.clone());
        let orchestrator = ScanOrchestrator::new(client, Arc::clone(&store));
        let aggregator = StatusAggregator::new(
            Arc::clone(&store),
            Arc::clone(&reports),
            orchestrator.in_flight().clone(),
        );
        let broadcaster =
            NotificationBroadcaster::spawn(Arc::clone(&store), self.config.broadcaster.clone())?;

        tracing::debug!(
            service = orchestrator.client().service_name(),
            scan_timeout_ms = self.config.client.scan_timeout.as_millis() as u64,
            "Scan gate built"
        );

        Ok(ScanGate {
            orchestrator,
            aggregator,
            broadcaster,
            reports,
            config: self.config,
        })
    }
}

impl Default for ScanGateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The result of scanning one file as part of a report scan.
#[derive(Debug)]
pub struct FileScanResult {
    /// The file that was scanned.
    pub file: FileReference,

    /// The recorded verdict, or why no scan ran.
    pub result: GateResult<ScanVerdict>,
}

impl FileScanResult {
    /// Returns the recorded verdict, if the scan ran.
    pub fn verdict(&self) -> Option<&ScanVerdict> {
        self.result.as_ref().ok()
    }
}

/// Entry point for scanning, gating, status, and alerts.
///
/// All read paths consult the verdict store at call time; nothing is
/// cached.
pub struct ScanGate {
    orchestrator: ScanOrchestrator,
    aggregator: StatusAggregator,
    broadcaster: NotificationBroadcaster,
    reports: ArcReportFiles,
    config: ScanGateConfig,
}

impl ScanGate {
    /// Creates a new builder.
    pub fn builder() -> ScanGateBuilder {
        ScanGateBuilder::new()
    }

    /// Requests a scan of one file and returns the recorded verdict.
    ///
    /// Fails with `InvalidInput` on empty fields or an unknown kind, and with
    /// `ScanInProgress` if the file is already being scanned.
    pub async fn request_scan(
        &self,
        file_url: &str,
        report_id: &str,
        file_kind: &str,
    ) -> GateResult<ScanVerdict> {
        self.orchestrator
            .request_scan(file_url, report_id, file_kind)
            .await
    }

    /// Scans a known file reference.
    pub async fn scan_file(&self, file: &FileReference) -> GateResult<ScanVerdict> {
        self.orchestrator.scan_file(file).await
    }

    /// Scans every file of a report concurrently.
    ///
    /// Per-file rejections (such as a scan already in flight) are reported
    /// in the results and do not abort the batch.
    pub async fn scan_report(&self, report_id: &str) -> GateResult<Vec<FileScanResult>> {
        if report_id.trim().is_empty() {
            return Err(ScanGateError::invalid_input("report_id"));
        }

        let files = self.reports.list_file_references(report_id).await?;

        tracing::info!(
            report_id = %report_id,
            file_count = files.len(),
            "Scanning report"
        );

        let scans = files.into_iter().map(|file| async move {
            let result = self.orchestrator.scan_file(&file).await;
            FileScanResult { file, result }
        });

        Ok(join_all(scans).await)
    }

    /// Returns the current verdict of a file, or `None` if it is unscanned.
    pub async fn current_verdict(&self, file_url: &str) -> GateResult<Option<ScanVerdict>> {
        self.orchestrator.store().current(file_url).await
    }

    /// Returns every verdict recorded for a file, oldest first.
    pub async fn verdict_history(&self, file_url: &str) -> GateResult<Vec<ScanVerdict>> {
        self.orchestrator.store().history(file_url).await
    }

    /// Returns the effective state of a file (`pending` while in flight).
    pub async fn file_state(&self, file_url: &str) -> GateResult<FileState> {
        self.orchestrator.file_state(file_url).await
    }

    /// Returns `true` if the file may be rendered.
    pub async fn can_view(&self, file_url: &str) -> GateResult<bool> {
        Ok(crate::gate::can_view(self.file_state(file_url).await?))
    }

    /// Returns `true` if the file may be downloaded.
    pub async fn can_download(&self, file_url: &str) -> GateResult<bool> {
        Ok(crate::gate::can_download(self.file_state(file_url).await?))
    }

    /// Evaluates the access gate for a file, auditing denials.
    pub async fn check_access(&self, file_url: &str) -> GateResult<AccessDecision> {
        let decision = AccessDecision::for_state(self.file_state(file_url).await?);

        if decision.is_allowed() {
            tracing::debug!(file_url = %file_url, "Access granted");
        } else {
            crate::audit::emit_access_denied(file_url, &decision);
        }

        Ok(decision)
    }

    /// Returns the current trust status of a report.
    pub async fn aggregate_status(&self, report_id: &str) -> GateResult<ReportThreatStatus> {
        self.aggregator.aggregate(report_id).await
    }

    /// Subscribes to threat alerts.
    pub fn subscribe_threats(&self) -> ThreatSubscription {
        self.broadcaster.subscribe()
    }

    /// Returns the recent-threats view, capped at `limit` reports.
    pub async fn recent_threats(&self, limit: usize) -> GateResult<Vec<ReportRollup>> {
        self.broadcaster.recent_threats(limit).await
    }

    /// Probes the scanning service.
    pub async fn health_check(&self) -> Result<(), TransportError> {
        self.orchestrator.client().health_check().await
    }

    /// Returns the verdict store.
    pub fn store(&self) -> &ArcVerdictStore {
        self.orchestrator.store()
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &ScanGateConfig {
        &self.config
    }
}

impl std::fmt::Debug for ScanGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanGate")
            .field("service", &self.orchestrator.client().service_name())
            .field("in_flight", &self.orchestrator.in_flight().len())
            .field("config", &self.config)
            .finish()
    }
}
