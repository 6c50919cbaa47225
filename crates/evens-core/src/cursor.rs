//! Per-session cursor storage and the allocator that hands it out.
//!
//! A `SessionCursor` is the only heap allocation a session makes. It is
//! created by a [`CursorAllocator`] when the session opens and handed back
//! to the same allocator when the session ends; `release` consumes the
//! cursor, so a second release of the same cursor cannot be expressed.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use tracing::{debug, warn};

use crate::error::EvensError;
use crate::stats::{AtomicCursorStats, CursorStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CursorSlot {
    position: u64,
    value: u64,
}

/// Bytes reserved for one cursor.
pub const CURSOR_BYTES: usize = std::mem::size_of::<CursorSlot>();

/// Heap-resident generation state for one read session.
#[derive(Debug)]
pub struct SessionCursor {
    slot: Box<CursorSlot>,
}

impl SessionCursor {
    fn boxed(position: u64, value: u64) -> Self {
        Self {
            slot: Box::new(CursorSlot { position, value }),
        }
    }

    /// Current zero-based position.
    #[inline]
    pub fn position(&self) -> u64 {
        self.slot.position
    }

    /// Element materialized for the current position.
    #[inline]
    pub fn value(&self) -> u64 {
        self.slot.value
    }

    /// Move the cursor in place.
    pub(crate) fn set(&mut self, position: u64, value: u64) {
        self.slot.position = position;
        self.slot.value = value;
    }
}

/// Source of cursor storage.
pub trait CursorAllocator {
    /// Reserve storage for a cursor positioned at `position`.
    fn allocate(&self, position: u64, value: u64) -> Result<SessionCursor, EvensError>;

    /// Return a cursor's storage.
    fn release(&self, cursor: SessionCursor);

    /// Snapshot of allocation activity.
    fn stats(&self) -> CursorStats;

    /// Release the cursor if one is held; returns whether anything was freed.
    fn release_held(&self, held: Option<SessionCursor>) -> bool {
        match held {
            Some(cursor) => {
                self.release(cursor);
                true
            }
            None => false,
        }
    }
}

/// Boxing allocator with an optional byte budget and failure injection.
pub struct HeapAllocator {
    budget: Option<usize>,
    outstanding: AtomicUsize,
    injected_failures: AtomicU64,
    stats: AtomicCursorStats,
}

impl HeapAllocator {
    /// Create an allocator with no budget.
    #[must_use]
    pub fn new() -> Self {
        Self {
            budget: None,
            outstanding: AtomicUsize::new(0),
            injected_failures: AtomicU64::new(0),
            stats: AtomicCursorStats::new(),
        }
    }

    /// Create an allocator that never holds more than `bytes` of cursor storage.
    #[must_use]
    pub fn with_budget(bytes: usize) -> Self {
        Self {
            budget: Some(bytes),
            ..Self::new()
        }
    }

    /// Make the next `count` allocations fail.
    pub fn fail_next(&self, count: u64) {
        self.injected_failures.store(count, Ordering::Relaxed);
    }

    /// Bytes currently held by live cursors.
    #[must_use]
    pub fn outstanding_bytes(&self) -> usize {
        self.outstanding.load(Ordering::Relaxed)
    }

    fn take_injected_failure(&self) -> bool {
        self.injected_failures
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok()
    }

    fn fail(&self, available: usize) -> EvensError {
        self.stats.record_failure();
        warn!(requested = CURSOR_BYTES, available, "Cursor allocation failed");
        EvensError::AllocationFailure {
            requested: CURSOR_BYTES,
            available,
        }
    }
}

impl Default for HeapAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl CursorAllocator for HeapAllocator {
    fn allocate(&self, position: u64, value: u64) -> Result<SessionCursor, EvensError> {
        let outstanding = self.outstanding.load(Ordering::Relaxed);
        if self.take_injected_failure() {
            return Err(self.fail(0));
        }
        if let Some(budget) = self.budget {
            if outstanding + CURSOR_BYTES > budget {
                return Err(self.fail(budget.saturating_sub(outstanding)));
            }
        }

        let cursor = SessionCursor::boxed(position, value);
        self.outstanding.fetch_add(CURSOR_BYTES, Ordering::Relaxed);
        self.stats.record_allocation();
        debug!(
            slot = ?std::ptr::from_ref(&*cursor.slot),
            position,
            "Allocated session cursor"
        );
        Ok(cursor)
    }

    fn release(&self, cursor: SessionCursor) {
        debug!(
            slot = ?std::ptr::from_ref(&*cursor.slot),
            position = cursor.position(),
            "Freeing session cursor"
        );
        drop(cursor);
        self.outstanding.fetch_sub(CURSOR_BYTES, Ordering::Relaxed);
        self.stats.record_release();
    }

    fn stats(&self) -> CursorStats {
        self.stats.snapshot()
    }
}
