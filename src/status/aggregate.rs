//! Worst-of aggregation of per-file verdicts into a report status.

use crate::core::{ArcReportFiles, FileReference, FileState, GateResult, ScanVerdict};
use crate::manager::InFlightSet;
use crate::store::ArcVerdictStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Trust status of a report, derived from its files' current verdicts.
///
/// Never stored; recomputed on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportThreatStatus {
    /// Report the status describes.
    pub report_id: String,

    /// Most severe file state across the report.
    pub worst_verdict: FileState,

    /// Detected threats across infected and suspicious files.
    pub threat_count: usize,

    /// Number of files attached to the report.
    pub file_count: usize,

    /// Latest `scanned_at` among the files' current verdicts.
    pub last_updated: Option<DateTime<Utc>>,
}

impl ReportThreatStatus {
    /// Returns `true` if every file is confirmed clean (or there are none).
    pub fn is_clean(&self) -> bool {
        self.worst_verdict == FileState::Clean
    }

    /// Returns `true` if any file carries a threat verdict.
    pub fn has_threats(&self) -> bool {
        matches!(
            self.worst_verdict,
            FileState::Infected | FileState::Suspicious
        )
    }
}

/// One file's contribution to a report status.
#[derive(Debug, Clone, PartialEq)]
pub struct FileStatus {
    /// File locator.
    pub file_url: String,

    /// Effective state of the file.
    pub state: FileState,

    /// Current recorded verdict, if any.
    pub current: Option<ScanVerdict>,
}

impl FileStatus {
    /// Builds a status from the recorded verdict alone.
    pub fn recorded(file_url: impl Into<String>, current: Option<ScanVerdict>) -> Self {
        let state = FileState::from(current.as_ref().map(|v| v.verdict));
        Self {
            file_url: file_url.into(),
            state,
            current,
        }
    }

    /// Raises the state to at least `pending` while a scan is in flight.
    pub fn with_in_flight(mut self, in_flight: bool) -> Self {
        if in_flight {
            self.state = self.state.worse(FileState::Pending);
        }
        self
    }

    fn threat_weight(&self) -> usize {
        match self.state {
            FileState::Infected | FileState::Suspicious => self
                .current
                .as_ref()
                .map_or(1, |v| v.detected_threats.len().max(1)),
            _ => 0,
        }
    }
}

/// Folds file statuses into a report status.
///
/// Pure and independent of the order of `files`. A report without files is
/// `clean` with a file count of zero.
pub fn aggregate(report_id: &str, files: &[FileStatus]) -> ReportThreatStatus {
    let worst_verdict = files
        .iter()
        .map(|f| f.state)
        .fold(FileState::Clean, FileState::worse);

    let threat_count = files.iter().map(FileStatus::threat_weight).sum();

    let last_updated = files
        .iter()
        .filter_map(|f| f.current.as_ref().map(|v| v.scanned_at))
        .max();

    ReportThreatStatus {
        report_id: report_id.to_string(),
        worst_verdict,
        threat_count,
        file_count: files.len(),
        last_updated,
    }
}

/// Computes report statuses from the verdict store on demand.
#[derive(Debug, Clone)]
pub struct StatusAggregator {
    store: ArcVerdictStore,
    reports: ArcReportFiles,
    in_flight: InFlightSet,
}

impl StatusAggregator {
    /// Creates an aggregator over a store and a report listing.
    ///
    /// `in_flight` should be the orchestrator's set so running scans show as
    /// `pending`.
    pub fn new(store: ArcVerdictStore, reports: ArcReportFiles, in_flight: InFlightSet) -> Self {
        Self {
            store,
            reports,
            in_flight,
        }
    }

    /// Returns the per-file statuses of a report.
    pub async fn file_statuses(&self, report_id: &str) -> GateResult<Vec<FileStatus>> {
        let files: Vec<FileReference> = self.reports.list_file_references(report_id).await?;
        let urls: Vec<String> = files.iter().map(|f| f.file_url.clone()).collect();
        let mut current: HashMap<String, ScanVerdict> = self.store.current_many(&urls).await?;

        Ok(files
            .into_iter()
            .map(|f| {
                let verdict = current.remove(&f.file_url);
                let in_flight = self.in_flight.contains(&f.file_url);
                FileStatus::recorded(f.file_url, verdict).with_in_flight(in_flight)
            })
            .collect())
    }

    /// Aggregates a report's current status.
    pub async fn aggregate(&self, report_id: &str) -> GateResult<ReportThreatStatus> {
        let statuses = self.file_statuses(report_id).await?;
        let status = aggregate(report_id, &statuses);

        tracing::debug!(
            report_id = %report_id,
            worst_verdict = %status.worst_verdict,
            threat_count = status.threat_count,
            file_count = status.file_count,
            "Report status aggregated"
        );

        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FileKind, StaticReportFiles, Verdict};
    use crate::store::{InMemoryVerdictStore, VerdictStore};
    use chrono::Duration;
    use std::sync::Arc;

    fn verdict(url: &str, v: Verdict) -> ScanVerdict {
        ScanVerdict::new(&FileReference::new(url, "r", FileKind::Image), v)
    }

    fn status(url: &str, v: Option<Verdict>) -> FileStatus {
        FileStatus::recorded(url, v.map(|v| verdict(url, v)))
    }

    #[test]
    fn test_clean_clean_infected() {
        let files = [
            status("a", Some(Verdict::Clean)),
            status("b", Some(Verdict::Clean)),
            status("c", Some(Verdict::Infected)),
        ];
        assert_eq!(aggregate("r", &files).worst_verdict, FileState::Infected);
    }

    #[test]
    fn test_clean_unscanned() {
        let files = [status("a", Some(Verdict::Clean)), status("b", None)];
        let result = aggregate("r", &files);
        assert_eq!(result.worst_verdict, FileState::Unscanned);
        assert_eq!(result.threat_count, 0);
    }

    #[test]
    fn test_no_files_is_clean() {
        let result = aggregate("r", &[]);
        assert_eq!(result.worst_verdict, FileState::Clean);
        assert_eq!(result.file_count, 0);
        assert!(result.last_updated.is_none());
        assert!(result.is_clean());
    }

    #[test]
    fn test_threat_count() {
        let infected = verdict("f2", Verdict::Infected).with_threats(["Trojan.A", "Worm.B"]);
        let files = [
            FileStatus::recorded("f2", Some(infected)),
            status("f3", Some(Verdict::Clean)),
        ];
        let result = aggregate("r2", &files);

        assert_eq!(result.worst_verdict, FileState::Infected);
        assert_eq!(result.threat_count, 2);
        assert_eq!(result.file_count, 2);
        assert!(result.has_threats());
    }

    #[test]
    fn test_bare_threat_verdict_counts_once() {
        let files = [
            status("a", Some(Verdict::Suspicious)),
            status("b", Some(Verdict::Infected)),
            status("c", Some(Verdict::ScanFailed)),
        ];
        assert_eq!(aggregate("r", &files).threat_count, 2);
    }

    #[test]
    fn test_severity_chain() {
        let cases = [
            (vec![Some(Verdict::Suspicious), Some(Verdict::Pending)], FileState::Suspicious),
            (vec![Some(Verdict::Pending), None], FileState::Pending),
            (vec![Some(Verdict::ScanFailed), Some(Verdict::Clean)], FileState::ScanFailed),
            (vec![None, Some(Verdict::ScanFailed)], FileState::ScanFailed),
            (vec![Some(Verdict::Clean)], FileState::Clean),
        ];
        for (verdicts, expected) in cases {
            let files: Vec<_> = verdicts
                .into_iter()
                .enumerate()
                .map(|(i, v)| status(&format!("f{i}"), v))
                .collect();
            assert_eq!(aggregate("r", &files).worst_verdict, expected);
        }
    }

    #[test]
    fn test_order_independent() {
        let mut files = vec![
            status("a", None),
            status("b", Some(Verdict::ScanFailed)),
            status("c", Some(Verdict::Clean)),
            status("d", Some(Verdict::Suspicious)),
        ];
        let forward = aggregate("r", &files);
        files.reverse();
        let backward = aggregate("r", &files);
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_in_flight_raises_to_pending() {
        assert_eq!(
            status("a", Some(Verdict::Clean)).with_in_flight(true).state,
            FileState::Pending
        );
        assert_eq!(
            status("a", Some(Verdict::Infected)).with_in_flight(true).state,
            FileState::Infected
        );
        assert_eq!(
            status("a", None).with_in_flight(false).state,
            FileState::Unscanned
        );
    }

    #[test]
    fn test_last_updated_is_latest() {
        let now = Utc::now();
        let files = [
            FileStatus::recorded("a", Some(verdict("a", Verdict::Clean).with_scanned_at(now))),
            FileStatus::recorded(
                "b",
                Some(verdict("b", Verdict::Clean).with_scanned_at(now - Duration::minutes(5))),
            ),
        ];
        assert_eq!(aggregate("r", &files).last_updated, Some(now));
    }

    #[tokio::test]
    async fn test_aggregator_reads_store() {
        let store = Arc::new(InMemoryVerdictStore::new());
        let reports = Arc::new(
            StaticReportFiles::new()
                .with_file(FileReference::new("f2", "r2", FileKind::Image))
                .with_file(FileReference::new("f3", "r2", FileKind::Document)),
        );
        store
            .insert(
                ScanVerdict::new(&FileReference::new("f2", "r2", FileKind::Image), Verdict::Infected)
                    .with_threats(["a", "b"]),
            )
            .await
            .unwrap();
        store
            .insert(ScanVerdict::new(
                &FileReference::new("f3", "r2", FileKind::Document),
                Verdict::Clean,
            ))
            .await
            .unwrap();

        let aggregator = StatusAggregator::new(store, reports, InFlightSet::new());
        let result = aggregator.aggregate("r2").await.unwrap();

        assert_eq!(result.worst_verdict, FileState::Infected);
        assert_eq!(result.threat_count, 2);
        assert_eq!(result.file_count, 2);
    }
}
