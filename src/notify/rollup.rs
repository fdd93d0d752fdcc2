//! The "recent threats" read model.

use crate::core::{ScanVerdict, Verdict};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One report's row in the recent-threats view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRollup {
    /// Report the row describes.
    pub report_id: String,

    /// Most severe verdict among the report's threat records.
    pub worst_verdict: Verdict,

    /// Number of distinct files with a current threat verdict.
    pub file_count: usize,

    /// Detected threats across those files.
    pub threat_count: usize,

    /// Latest `scanned_at` among those records.
    pub most_recent: DateTime<Utc>,
}

/// Builds the recent-threats view from current verdicts.
///
/// Only `infected` and `suspicious` records are considered. Rows are ordered
/// most recent first (report ID breaks ties) and capped at `limit`.
pub fn recent_threats(current: &[ScanVerdict], limit: usize) -> Vec<ReportRollup> {
    struct Acc<'a> {
        worst: Verdict,
        files: HashSet<&'a str>,
        threats: usize,
        most_recent: DateTime<Utc>,
    }

    let mut by_report: HashMap<&str, Acc<'_>> = HashMap::new();

    for record in current.iter().filter(|v| v.is_threat()) {
        let acc = by_report
            .entry(record.report_id.as_str())
            .or_insert_with(|| Acc {
                worst: record.verdict,
                files: HashSet::new(),
                threats: 0,
                most_recent: record.scanned_at,
            });

        if record.verdict == Verdict::Infected {
            acc.worst = Verdict::Infected;
        }
        if acc.files.insert(record.file_url.as_str()) {
            acc.threats += record.threat_weight();
        }
        acc.most_recent = acc.most_recent.max(record.scanned_at);
    }

    let mut rows: Vec<ReportRollup> = by_report
        .into_iter()
        .map(|(report_id, acc)| ReportRollup {
            report_id: report_id.to_string(),
            worst_verdict: acc.worst,
            file_count: acc.files.len(),
            threat_count: acc.threats,
            most_recent: acc.most_recent,
        })
        .collect();

    rows.sort_by(|a, b| {
        b.most_recent
            .cmp(&a.most_recent)
            .then_with(|| a.report_id.cmp(&b.report_id))
    });
    rows.truncate(limit);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FileKind, FileReference};
    use chrono::Duration;

    fn record(url: &str, report: &str, verdict: Verdict, age_secs: i64) -> ScanVerdict {
        ScanVerdict::new(&FileReference::new(url, report, FileKind::Image), verdict)
            .with_scanned_at(Utc::now() - Duration::seconds(age_secs))
    }

    #[test]
    fn test_groups_by_report() {
        let current = vec![
            record("a", "r1", Verdict::Suspicious, 30).with_threats(["x"]),
            record("b", "r1", Verdict::Infected, 20).with_threats(["y", "z"]),
            record("c", "r2", Verdict::Suspicious, 10),
            record("d", "r3", Verdict::Clean, 0),
        ];
        let rows = recent_threats(&current, 10);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].report_id, "r2");
        assert_eq!(rows[0].worst_verdict, Verdict::Suspicious);
        assert_eq!(rows[0].threat_count, 1);

        assert_eq!(rows[1].report_id, "r1");
        assert_eq!(rows[1].worst_verdict, Verdict::Infected);
        assert_eq!(rows[1].file_count, 2);
        assert_eq!(rows[1].threat_count, 3);
        assert_eq!(rows[1].most_recent, current[1].scanned_at);
    }

    #[test]
    fn test_limit() {
        let current: Vec<_> = (0..5)
            .map(|i| record(&format!("f{i}"), &format!("r{i}"), Verdict::Infected, i))
            .collect();
        let rows = recent_threats(&current, 3);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].report_id, "r0");
        assert_eq!(rows[2].report_id, "r2");
        assert!(recent_threats(&current, 0).is_empty());
    }

    #[test]
    fn test_ignores_non_threats() {
        let current = vec![
            record("a", "r1", Verdict::Clean, 0),
            record("b", "r1", Verdict::ScanFailed, 0),
            record("c", "r1", Verdict::Pending, 0),
        ];
        assert!(recent_threats(&current, 10).is_empty());
    }
}
