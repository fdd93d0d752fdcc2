//! Per-file in-flight tracking for scan requests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Concurrency-safe set of file locators currently being scanned.
///
/// Membership is scoped per locator, so scans of unrelated files never
/// block each other.
#[derive(Debug, Clone, Default)]
pub struct InFlightSet {
    files: Arc<Mutex<HashSet<String>>>,
}

impl InFlightSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a file as in flight.
    ///
    /// Returns `None` if the file is already in flight. The returned guard
    /// clears the mark when dropped, whether the scan completed, failed, or
    /// the owning future was cancelled.
    pub fn try_acquire(&self, file_url: &str) -> Option<InFlightGuard> {
        let inserted = self
            .files
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(file_url.to_string());

        inserted.then(|| InFlightGuard {
            files: Arc::clone(&self.files),
            file_url: file_url.to_string(),
        })
    }

    /// Returns `true` if the file is in flight.
    pub fn contains(&self, file_url: &str) -> bool {
        self.files
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(file_url)
    }

    /// Returns the number of files in flight.
    pub fn len(&self) -> usize {
        self.files
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Returns `true` if nothing is in flight.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Marks one file as in flight for as long as it lives.
#[derive(Debug)]
pub struct InFlightGuard {
    files: Arc<Mutex<HashSet<String>>>,
    file_url: String,
}

impl InFlightGuard {
    /// Returns the guarded file locator.
    pub fn file_url(&self) -> &str {
        &self.file_url
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.files
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&self.file_url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_and_release() {
        let set = InFlightSet::new();

        let guard = set.try_acquire("f1").unwrap();
        assert!(set.contains("f1"));
        assert_eq!(guard.file_url(), "f1");

        assert!(set.try_acquire("f1").is_none());

        drop(guard);
        assert!(!set.contains("f1"));
        assert!(set.try_acquire("f1").is_some());
    }

    #[test]
    fn test_files_are_independent() {
        let set = InFlightSet::new();
        let _a = set.try_acquire("a").unwrap();
        let _b = set.try_acquire("b").unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_clones_share_state() {
        let set = InFlightSet::new();
        let other = set.clone();
        let _guard = set.try_acquire("f1").unwrap();
        assert!(other.try_acquire("f1").is_none());
        assert!(!set.is_empty());
    }
}
