//! Verdict store trait definition.

use crate::core::{GateResult, ScanVerdict};

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;
use tokio::sync::broadcast;

/// A verdict together with its position in the store's log.
///
/// Sequence numbers start at zero and increase by one per insertion, so a
/// consumer can tell from a gap that it missed records.
#[derive(Debug, Clone, PartialEq)]
pub struct VerdictEvent {
    /// Position of the record in insertion order.
    pub sequence: u64,

    /// The inserted record.
    pub verdict: ScanVerdict,
}

/// A subscription to the store's change feed.
///
/// The feed is bounded. A receiver that falls behind sees
/// `RecvError::Lagged` and can recover the skipped records with
/// [`VerdictStore::since`].
#[derive(Debug)]
pub struct VerdictFeed {
    /// Sequence number the first delivered event will carry.
    pub next_sequence: u64,

    /// Events in sequence order.
    pub receiver: broadcast::Receiver<VerdictEvent>,
}

/// Append-only log of scan verdicts, keyed by file locator.
///
/// The store is the single source of truth for verdicts. Implementations
/// must never update or remove a record once inserted.
///
/// # Current verdict
///
/// The current verdict of a file is its record with the latest
/// `scanned_at`. When two records share a timestamp, the one inserted last
/// wins.
///
/// # Change feed
///
/// Every insertion is published as a [`VerdictEvent`] in sequence order.
/// `subscribe` must report the sequence of the next insertion atomically
/// with registering the receiver.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use scangate::store::{VerdictEvent, VerdictFeed, VerdictStore};
/// use scangate::core::{GateResult, ScanVerdict};
/// use async_trait::async_trait;
///
/// #[derive(Debug)]
/// struct PgVerdictStore { /* pool, change feed */ }
///
/// #[async_trait]
/// impl VerdictStore for PgVerdictStore {
///     async fn insert(&self, verdict: ScanVerdict) -> GateResult<()> { todo!() }
///     async fn history(&self, file_url: &str) -> GateResult<Vec<ScanVerdict>> { todo!() }
///     async fn by_report(&self, report_id: &str) -> GateResult<Vec<ScanVerdict>> { todo!() }
///     async fn latest_per_file(&self) -> GateResult<Vec<ScanVerdict>> { todo!() }
///     async fn since(&self, sequence: u64) -> GateResult<Vec<VerdictEvent>> { todo!() }
///     fn subscribe(&self) -> VerdictFeed { todo!() }
/// }
/// ```
#[async_trait]
pub trait VerdictStore: Send + Sync + Debug {
    /// Appends a verdict and publishes it on the change feed.
    async fn insert(&self, verdict: ScanVerdict) -> GateResult<()>;

    /// Returns every verdict recorded for a file, in insertion order.
    async fn history(&self, file_url: &str) -> GateResult<Vec<ScanVerdict>>;

    /// Returns every verdict recorded for files of a report, in insertion order.
    async fn by_report(&self, report_id: &str) -> GateResult<Vec<ScanVerdict>>;

    /// Returns the current verdict of every file that has one.
    async fn latest_per_file(&self) -> GateResult<Vec<ScanVerdict>>;

    /// Returns every record at or after `sequence`, in sequence order.
    async fn since(&self, sequence: u64) -> GateResult<Vec<VerdictEvent>>;

    /// Subscribes to the insertion change feed.
    ///
    /// Only insertions made after subscribing are delivered.
    fn subscribe(&self) -> VerdictFeed;

    /// Returns the current verdict of a file, or `None` if it is unscanned.
    async fn current(&self, file_url: &str) -> GateResult<Option<ScanVerdict>> {
        let history = self.history(file_url).await?;
        Ok(latest(history.iter()).cloned())
    }

    /// Returns the current verdicts of several files, keyed by locator.
    ///
    /// Unscanned files are absent from the map.
    async fn current_many(&self, file_urls: &[String]) -> GateResult<HashMap<String, ScanVerdict>> {
        let mut current = HashMap::with_capacity(file_urls.len());
        for file_url in file_urls {
            if let Some(verdict) = self.current(file_url).await? {
                current.insert(file_url.clone(), verdict);
            }
        }
        Ok(current)
    }

    /// Returns the number of records for a file.
    async fn count(&self, file_url: &str) -> GateResult<usize> {
        Ok(self.history(file_url).await?.len())
    }
}

/// An arc-wrapped verdict store for shared ownership.
pub type ArcVerdictStore = std::sync::Arc<dyn VerdictStore>;

/// Picks the current verdict out of records given in insertion order.
pub fn latest<'a>(records: impl Iterator<Item = &'a ScanVerdict>) -> Option<&'a ScanVerdict> {
    records.fold(None, |best, record| match best {
        Some(b) if b.scanned_at > record.scanned_at => Some(b),
        _ => Some(record),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FileKind, FileReference, Verdict};
    use chrono::{Duration, Utc};

    #[test]
    fn test_latest_by_timestamp() {
        let file = FileReference::new("f1", "r1", FileKind::Image);
        let now = Utc::now();
        let newer = ScanVerdict::new(&file, Verdict::Clean).with_scanned_at(now);
        let older = ScanVerdict::new(&file, Verdict::Infected)
            .with_scanned_at(now - Duration::seconds(10));

        // Inserted out of timestamp order
        let records = [newer.clone(), older];
        assert_eq!(latest(records.iter()).map(|v| &v.id), Some(&newer.id));
    }

    #[test]
    fn test_latest_tie_goes_to_last_inserted() {
        let file = FileReference::new("f1", "r1", FileKind::Image);
        let now = Utc::now();
        let first = ScanVerdict::new(&file, Verdict::Infected).with_scanned_at(now);
        let second = ScanVerdict::new(&file, Verdict::Clean).with_scanned_at(now);

        let records = [first, second.clone()];
        assert_eq!(latest(records.iter()).map(|v| &v.id), Some(&second.id));
    }

    #[test]
    fn test_latest_empty() {
        assert!(latest(std::iter::empty()).is_none());
    }
}
