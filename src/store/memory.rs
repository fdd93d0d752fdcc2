//! In-memory verdict store.

use crate::core::{GateResult, ScanVerdict};
use crate::store::traits::{latest, VerdictEvent, VerdictFeed, VerdictStore};

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use tokio::sync::broadcast;

/// Configuration for the in-memory verdict store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Buffered insertions per change-feed subscriber before it lags.
    pub feed_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            feed_capacity: 1024,
        }
    }
}

impl StoreConfig {
    /// Creates a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the change-feed capacity.
    pub fn with_feed_capacity(mut self, capacity: usize) -> Self {
        self.feed_capacity = capacity.max(1);
        self
    }
}

#[derive(Debug, Default)]
struct Log {
    /// Every record, in insertion order.
    records: Vec<ScanVerdict>,
    /// Positions in `records`, per file locator.
    by_file: HashMap<String, Vec<usize>>,
}

impl Log {
    fn file_records<'a>(&'a self, file_url: &str) -> impl Iterator<Item = &'a ScanVerdict> + 'a {
        self.by_file
            .get(file_url)
            .into_iter()
            .flatten()
            .map(move |&i| &self.records[i])
    }
}

/// A verdict store held in process memory.
///
/// Records live as long as the store. Suitable for tests, single-node
/// deployments, and as a reference for durable implementations.
#[derive(Debug)]
pub struct InMemoryVerdictStore {
    log: RwLock<Log>,
    feed: broadcast::Sender<VerdictEvent>,
}

impl InMemoryVerdictStore {
    /// Creates an empty store with default configuration.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Creates an empty store with the given configuration.
    pub fn with_config(config: StoreConfig) -> Self {
        let (feed, _rx) = broadcast::channel(config.feed_capacity.max(1));
        Self {
            log: RwLock::new(Log::default()),
            feed,
        }
    }

    /// Returns the total number of records.
    pub fn len(&self) -> usize {
        self.log
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .records
            .len()
    }

    /// Returns `true` if no verdict has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryVerdictStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VerdictStore for InMemoryVerdictStore {
    async fn insert(&self, verdict: ScanVerdict) -> GateResult<()> {
        let mut log = self
            .log
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let position = log.records.len();
        log.by_file
            .entry(verdict.file_url.clone())
            .or_default()
            .push(position);
        log.records.push(verdict.clone());

        // Published under the lock so the feed stays in sequence order.
        // No receivers is not an error.
        let _ = self.feed.send(VerdictEvent {
            sequence: position as u64,
            verdict,
        });
        Ok(())
    }

    async fn history(&self, file_url: &str) -> GateResult<Vec<ScanVerdict>> {
        let log = self
            .log
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(log.file_records(file_url).cloned().collect())
    }

    async fn by_report(&self, report_id: &str) -> GateResult<Vec<ScanVerdict>> {
        let log = self
            .log
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(log
            .records
            .iter()
            .filter(|v| v.report_id == report_id)
            .cloned()
            .collect())
    }

    async fn latest_per_file(&self) -> GateResult<Vec<ScanVerdict>> {
        let log = self
            .log
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(log
            .by_file
            .keys()
            .filter_map(|file_url| latest(log.file_records(file_url)).cloned())
            .collect())
    }

    async fn since(&self, sequence: u64) -> GateResult<Vec<VerdictEvent>> {
        let log = self
            .log
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let start = usize::try_from(sequence).unwrap_or(usize::MAX);
        Ok(log
            .records
            .iter()
            .enumerate()
            .skip(start)
            .map(|(i, verdict)| VerdictEvent {
                sequence: i as u64,
                verdict: verdict.clone(),
            })
            .collect())
    }

    fn subscribe(&self) -> VerdictFeed {
        // Inserts publish under the write lock, so no insertion can fall
        // between reading the length and registering the receiver.
        let log = self
            .log
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        VerdictFeed {
            next_sequence: log.records.len() as u64,
            receiver: self.feed.subscribe(),
        }
    }

    async fn current(&self, file_url: &str) -> GateResult<Option<ScanVerdict>> {
        let log = self
            .log
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(latest(log.file_records(file_url)).cloned())
    }

    async fn count(&self, file_url: &str) -> GateResult<usize> {
        let log = self
            .log
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(log.by_file.get(file_url).map_or(0, Vec::len))
    }
}
