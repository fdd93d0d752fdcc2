//! Push-based threat alerts driven by the verdict store's change feed.

use crate::core::{GateResult, ScanGateError, ScanVerdict, Verdict};
use crate::notify::rollup::{recent_threats, ReportRollup};
use crate::store::{ArcVerdictStore, VerdictEvent, VerdictFeed};

use chrono::{DateTime, Utc};
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Alert raised when an `infected` or `suspicious` verdict is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatNotification {
    /// Report owning the file.
    pub report_id: String,

    /// File the verdict is about.
    pub file_url: String,

    /// The threat verdict.
    pub verdict: Verdict,

    /// Number of itemized detections (at least one).
    pub threat_detail_count: usize,

    /// When the verdict was recorded.
    pub occurred_at: DateTime<Utc>,
}

impl ThreatNotification {
    /// Builds an alert for a newly recorded verdict.
    ///
    /// Returns `None` unless the verdict is evidence of a threat.
    pub fn from_verdict(verdict: &ScanVerdict) -> Option<Self> {
        verdict.is_threat().then(|| Self {
            report_id: verdict.report_id.clone(),
            file_url: verdict.file_url.clone(),
            verdict: verdict.verdict,
            threat_detail_count: verdict.threat_weight(),
            occurred_at: verdict.scanned_at,
        })
    }
}

/// Configuration for the notification broadcaster.
#[derive(Debug, Clone)]
pub struct BroadcasterConfig {
    /// Row cap used by [`NotificationBroadcaster::recent_threats_default`].
    pub recent_limit: usize,
}

impl Default for BroadcasterConfig {
    fn default() -> Self {
        Self { recent_limit: 20 }
    }
}

impl BroadcasterConfig {
    /// Creates a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default recent-threats row cap.
    pub fn with_recent_limit(mut self, limit: usize) -> Self {
        self.recent_limit = limit;
        self
    }
}

/// A live subscription to threat alerts.
///
/// Each subscription has its own unbounded queue, so a slow subscriber
/// never loses alerts; it only delays its own view of them.
#[derive(Debug)]
pub struct ThreatSubscription {
    rx: mpsc::UnboundedReceiver<ThreatNotification>,
}

impl ThreatSubscription {
    /// Waits for the next alert.
    ///
    /// Returns `None` once the broadcaster has shut down and every queued
    /// alert has been received.
    pub async fn recv(&mut self) -> Option<ThreatNotification> {
        self.rx.recv().await
    }

    /// Returns the next alert if one is already queued.
    pub fn try_recv(&mut self) -> Option<ThreatNotification> {
        self.rx.try_recv().ok()
    }

    /// Converts the subscription into a stream of alerts.
    pub fn into_stream(self) -> impl Stream<Item = ThreatNotification> {
        futures::stream::unfold(self, |mut sub| async move {
            sub.recv().await.map(|notification| (notification, sub))
        })
    }
}

type Subscribers = Arc<Mutex<Vec<mpsc::UnboundedSender<ThreatNotification>>>>;

/// Turns verdict insertions into threat alerts and serves the recent-threats
/// view.
///
/// A background task follows the store's change feed for the lifetime of the
/// broadcaster. It tracks feed sequence numbers and re-reads anything it
/// missed from the store, so every threat recorded while a subscriber is
/// subscribed reaches that subscriber. There is no replay for late
/// subscribers.
#[derive(Debug)]
pub struct NotificationBroadcaster {
    subscribers: Subscribers,
    store: ArcVerdictStore,
    config: BroadcasterConfig,
    task: JoinHandle<()>,
}

impl NotificationBroadcaster {
    /// Attaches a broadcaster to a store.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(store: ArcVerdictStore, config: BroadcasterConfig) -> GateResult<Self> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            ScanGateError::configuration("notification broadcaster requires a tokio runtime")
        })?;

        let subscribers: Subscribers = Arc::default();
        // Subscribe before spawning so no insertion slips through
        let feed = store.subscribe();
        let task = runtime.spawn(forward_threats(
            Arc::clone(&store),
            feed,
            Arc::clone(&subscribers),
        ));

        Ok(Self {
            subscribers,
            store,
            config,
            task,
        })
    }

    /// Subscribes to threat alerts.
    pub fn subscribe(&self) -> ThreatSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(tx);
        ThreatSubscription { rx }
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        subscribers.retain(|tx| !tx.is_closed());
        subscribers.len()
    }

    /// Returns the recent-threats view, capped at `limit` reports.
    ///
    /// Reads the store directly; independent of the push channel.
    pub async fn recent_threats(&self, limit: usize) -> GateResult<Vec<ReportRollup>> {
        let current = self.store.latest_per_file().await?;
        Ok(recent_threats(&current, limit))
    }

    /// Returns the recent-threats view with the configured row cap.
    pub async fn recent_threats_default(&self) -> GateResult<Vec<ReportRollup>> {
        self.recent_threats(self.config.recent_limit).await
    }
}

impl Drop for NotificationBroadcaster {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn forward_threats(store: ArcVerdictStore, feed: VerdictFeed, subscribers: Subscribers) {
    let VerdictFeed {
        next_sequence: mut next,
        mut receiver,
    } = feed;

    loop {
        match receiver.recv().await {
            Ok(event) => {
                if event.sequence > next {
                    catch_up(&store, &mut next, &subscribers).await;
                }
                if event.sequence >= next {
                    next = event.sequence + 1;
                    publish(&event.verdict, &subscribers);
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(
                    skipped,
                    from_sequence = next,
                    "Verdict change feed lagged, re-reading from store"
                );
                catch_up(&store, &mut next, &subscribers).await;
            }
            Err(RecvError::Closed) => {
                tracing::debug!("Verdict change feed closed, stopping threat forwarding");
                break;
            }
        }
    }
}

/// Publishes every stored record from `next` onwards and advances `next`.
async fn catch_up(store: &ArcVerdictStore, next: &mut u64, subscribers: &Subscribers) {
    match store.since(*next).await {
        Ok(events) => {
            for VerdictEvent { sequence, verdict } in events {
                if sequence >= *next {
                    *next = sequence + 1;
                    publish(&verdict, subscribers);
                }
            }
        }
        Err(e) => {
            tracing::error!(
                from_sequence = *next,
                error = %e,
                "Failed to re-read verdicts after feed gap"
            );
        }
    }
}

fn publish(verdict: &ScanVerdict, subscribers: &Subscribers) {
    let Some(notification) = ThreatNotification::from_verdict(verdict) else {
        return;
    };
    crate::audit::emit_threat_detected(&notification);

    subscribers
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .retain(|tx| tx.send(notification.clone()).is_ok());
}
