//! Cancellation tokens for query scans.
//!
//! A scan is abandoned by moving the tracker to a newer version; tokens
//! handed out for older versions then report cancellation the next time the
//! scan checks.
//!
//! ## Sparse Checking
//!
//! Walks that touch millions of entries call `is_cancelled_sparse()`, which
//! only reads the atomic every `CANCEL_CHECK_INTERVAL` iterations.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// How often long-running loops check for cancellation. Must be a power
/// of two.
pub const CANCEL_CHECK_INTERVAL: usize = 0x1000;

/// Tracks the active scan version.
#[derive(Debug, Default)]
pub struct SearchVersionTracker {
    active_version: Arc<AtomicU64>,
}

impl SearchVersionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new version, cancelling every token issued for older ones.
    pub fn next_version(&self) -> u64 {
        self.active_version.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current_version(&self) -> u64 {
        self.active_version.load(Ordering::SeqCst)
    }

    /// Token that stays live until the tracker moves past `version`.
    pub fn token_for_version(&self, version: u64) -> CancellationToken {
        CancellationToken {
            active_version: Some(Arc::clone(&self.active_version)),
            version,
        }
    }

    /// Starts a new version and returns its token.
    pub fn start(&self) -> CancellationToken {
        let version = self.next_version();
        self.token_for_version(version)
    }
}

#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    /// `None` for tokens that can never be cancelled.
    active_version: Option<Arc<AtomicU64>>,
    version: u64,
}

impl CancellationToken {
    /// A token that is never cancelled.
    pub fn noop() -> Self {
        Self::default()
    }

    /// Returns `Some(())` while active and `None` once cancelled, so callers
    /// can bail out with `?`.
    #[inline]
    pub fn is_cancelled(&self) -> Option<()> {
        match &self.active_version {
            Some(active) if active.load(Ordering::Relaxed) != self.version => None,
            _ => Some(()),
        }
    }

    /// Like [`is_cancelled`](Self::is_cancelled), but only reads the atomic
    /// once every `CANCEL_CHECK_INTERVAL` calls.
    #[inline]
    pub fn is_cancelled_sparse(&self, counter: usize) -> Option<()> {
        if counter & (CANCEL_CHECK_INTERVAL - 1) == 0 {
            self.is_cancelled()
        } else {
            Some(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_token_is_never_cancelled() {
        let token = CancellationToken::noop();
        assert!(token.is_cancelled().is_some());
    }

    #[test]
    fn newer_version_cancels_older_tokens() {
        let tracker = SearchVersionTracker::new();
        let first = tracker.start();
        assert!(first.is_cancelled().is_some());

        let second = tracker.start();
        assert!(first.is_cancelled().is_none());
        assert!(second.is_cancelled().is_some());
        assert_eq!(tracker.current_version(), 2);
    }

    #[test]
    fn sparse_check_skips_between_intervals() {
        let tracker = SearchVersionTracker::new();
        let token = tracker.start();
        tracker.next_version();
        assert!(token.is_cancelled_sparse(1).is_some());
        assert!(token.is_cancelled_sparse(CANCEL_CHECK_INTERVAL).is_none());
    }
}
