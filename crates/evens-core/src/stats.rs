//! Atomic cursor statistics for allocation tracking.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of cursor allocator activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CursorStats {
    /// Cursors handed out.
    pub allocations: u64,
    /// Cursors returned.
    pub releases: u64,
    /// Allocation attempts that failed.
    pub failures: u64,
}

impl CursorStats {
    /// Cursors currently outstanding.
    #[must_use]
    pub fn live(&self) -> u64 {
        self.allocations.saturating_sub(self.releases)
    }
}

/// Atomic counters behind [`CursorStats`].
pub struct AtomicCursorStats {
    allocations: AtomicU64,
    releases: AtomicU64,
    failures: AtomicU64,
}

impl AtomicCursorStats {
    /// Create new zeroed stats.
    pub fn new() -> Self {
        Self {
            allocations: AtomicU64::new(0),
            releases: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    /// Take a snapshot of current stats.
    pub fn snapshot(&self) -> CursorStats {
        CursorStats {
            allocations: self.allocations.load(Ordering::Relaxed),
            releases: self.releases.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.allocations.store(0, Ordering::Relaxed);
        self.releases.store(0, Ordering::Relaxed);
        self.failures.store(0, Ordering::Relaxed);
    }

    /// Increment allocation counter.
    pub fn record_allocation(&self) {
        self.allocations.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment release counter.
    pub fn record_release(&self) {
        self.releases.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment failure counter.
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for AtomicCursorStats {
    fn default() -> Self {
        Self::new()
    }
}
