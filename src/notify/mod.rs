//! Threat notifications.
//!
//! - [`NotificationBroadcaster`] pushes a [`ThreatNotification`] to every
//!   subscriber when an `infected` or `suspicious` verdict is recorded.
//! - [`recent_threats`] builds the pull-based per-report rollup backing a
//!   "recent threats" panel.

mod broadcaster;
mod rollup;

pub use broadcaster::{
    BroadcasterConfig, NotificationBroadcaster, ThreatNotification, ThreatSubscription,
};
pub use rollup::{recent_threats, ReportRollup};
