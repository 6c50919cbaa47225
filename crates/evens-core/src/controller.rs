//! Session state machine driven by a chunked sequential reader.
//!
//! One `IteratorController` is one read session: a single `open`, any number
//! of `produce`/`show` and `advance` calls, then `close`. The controller owns
//! the session's cursor for as long as it is `Active`; exhausting the
//! sequence and releasing the cursor happen together in `advance`.

use std::fmt;

use tracing::debug;

use crate::cursor::{CursorAllocator, SessionCursor};
use crate::descriptor::SequenceDescriptor;
use crate::sink::RenderSink;

/// Observable lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// `open` has not been called yet.
    Unopened,
    /// A cursor is held.
    Active,
    /// The sequence ran out; no cursor is held.
    Exhausted,
    /// Opening failed to obtain a cursor.
    Aborted,
    /// The session is over.
    Closed,
}

/// Result of `open` and `advance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A cursor is live; `produce` yields an element.
    Active,
    /// No more data for this session.
    Done,
}

impl Step {
    /// Whether the session has no more data.
    #[inline]
    pub fn is_done(self) -> bool {
        self == Self::Done
    }
}

/// Result of handing the current element to a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Show {
    /// The record was written.
    Written,
    /// The sink had no room; the element is still current.
    Full,
    /// No element to show.
    Idle,
}

enum SessionState {
    Unopened,
    Active(SessionCursor),
    Exhausted,
    Aborted,
    Closed,
}

/// Open/produce/advance/close protocol over one session.
pub struct IteratorController<'a> {
    descriptor: &'a SequenceDescriptor,
    allocator: &'a dyn CursorAllocator,
    state: SessionState,
}

impl<'a> IteratorController<'a> {
    /// Create an unopened session over `descriptor`.
    pub fn new(descriptor: &'a SequenceDescriptor, allocator: &'a dyn CursorAllocator) -> Self {
        Self {
            descriptor,
            allocator,
            state: SessionState::Unopened,
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        match self.state {
            SessionState::Unopened => Phase::Unopened,
            SessionState::Active(_) => Phase::Active,
            SessionState::Exhausted => Phase::Exhausted,
            SessionState::Aborted => Phase::Aborted,
            SessionState::Closed => Phase::Closed,
        }
    }

    /// Position of the live cursor, if any.
    pub fn position(&self) -> Option<u64> {
        self.cursor().map(SessionCursor::position)
    }

    fn cursor(&self) -> Option<&SessionCursor> {
        match &self.state {
            SessionState::Active(cursor) => Some(cursor),
            _ => None,
        }
    }

    /// Start the session at `start`.
    ///
    /// Returns `Step::Done` without allocating when `start` is past the end,
    /// when cursor allocation fails, or when the session was already opened.
    pub fn open(&mut self, start: u64) -> Step {
        debug!(start, limit = self.descriptor.limit(), "Entering open");
        if !matches!(self.state, SessionState::Unopened) {
            debug!(phase = ?self.phase(), "Session already opened");
            return Step::Done;
        }

        if !self.descriptor.contains(start) {
            debug!("Apparently, we're done");
            self.state = SessionState::Exhausted;
            return Step::Done;
        }

        match self
            .allocator
            .allocate(start, self.descriptor.generate(start))
        {
            Ok(cursor) => {
                self.state = SessionState::Active(cursor);
                Step::Active
            }
            Err(err) => {
                debug!(%err, "Session aborted at open");
                self.state = SessionState::Aborted;
                Step::Done
            }
        }
    }

    /// Current element; repeated calls return the same value.
    pub fn produce(&self) -> Option<u64> {
        self.cursor().map(SessionCursor::value)
    }

    /// Hand the current element to `sink`.
    ///
    /// On `Show::Full` the cursor is left where it is, so the same element is
    /// offered again in the next round.
    pub fn show<S: RenderSink + ?Sized>(&self, sink: &mut S) -> Show {
        let Some(value) = self.produce() else {
            return Show::Idle;
        };
        debug!(value, "In show");
        match sink.render(value) {
            Ok(()) => Show::Written,
            Err(_) => Show::Full,
        }
    }

    /// Move to the next position, releasing the cursor at the end.
    pub fn advance(&mut self) -> Step {
        let SessionState::Active(cursor) = &mut self.state else {
            return Step::Done;
        };

        let next = cursor.position() + 1;
        debug!(position = cursor.position(), next, "In advance");
        if self.descriptor.contains(next) {
            cursor.set(next, self.descriptor.generate(next));
            return Step::Active;
        }

        if let SessionState::Active(cursor) =
            std::mem::replace(&mut self.state, SessionState::Exhausted)
        {
            self.allocator.release(cursor);
        }
        Step::Done
    }

    /// End the session from any phase. Safe to call repeatedly.
    pub fn close(&mut self) {
        debug!(phase = ?self.phase(), "Entering close");
        let held = match std::mem::replace(&mut self.state, SessionState::Closed) {
            SessionState::Active(cursor) => Some(cursor),
            _ => None,
        };
        if !self.allocator.release_held(held) {
            debug!("Cursor is already released");
        }
    }
}

impl fmt::Debug for IteratorController<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IteratorController")
            .field("descriptor", self.descriptor)
            .field("phase", &self.phase())
            .field("position", &self.position())
            .finish_non_exhaustive()
    }
}

impl Drop for IteratorController<'_> {
    fn drop(&mut self) {
        if matches!(self.state, SessionState::Active(_)) {
            self.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::HeapAllocator;
    use crate::sink::SinkFull;

    /// Sink that accepts a fixed number of records, then reports full.
    struct CountingSink {
        room: usize,
        seen: Vec<u64>,
        full: bool,
    }

    impl CountingSink {
        fn with_room(room: usize) -> Self {
            Self {
                room,
                seen: Vec::new(),
                full: false,
            }
        }
    }

    impl RenderSink for CountingSink {
        fn render(&mut self, element: u64) -> Result<(), SinkFull> {
            if self.seen.len() == self.room {
                self.full = true;
                return Err(SinkFull);
            }
            self.seen.push(element);
            Ok(())
        }

        fn is_full(&self) -> bool {
            self.full
        }
    }

    fn drain(ctl: &mut IteratorController<'_>, start: u64) -> Vec<u64> {
        let mut out = Vec::new();
        if ctl.open(start).is_done() {
            return out;
        }
        loop {
            out.push(ctl.produce().unwrap());
            if ctl.advance().is_done() {
                break;
            }
        }
        out
    }

    #[test]
    fn full_session_default_limit() {
        let desc = SequenceDescriptor::new(10).unwrap();
        let alloc = HeapAllocator::new();
        let mut ctl = IteratorController::new(&desc, &alloc);
        assert_eq!(drain(&mut ctl, 0), [0, 2, 4, 6, 8, 10, 12, 14, 16, 18]);
        assert_eq!(ctl.phase(), Phase::Exhausted);
        ctl.close();
        assert_eq!(ctl.phase(), Phase::Closed);

        let stats = alloc.stats();
        assert_eq!(stats.allocations, 1);
        assert_eq!(stats.releases, 1);
    }

    #[test]
    fn limit_one_is_done_on_first_advance() {
        let desc = SequenceDescriptor::new(1).unwrap();
        let alloc = HeapAllocator::new();
        let mut ctl = IteratorController::new(&desc, &alloc);
        assert_eq!(ctl.open(0), Step::Active);
        assert_eq!(ctl.produce(), Some(0));
        assert_eq!(ctl.advance(), Step::Done);
        assert_eq!(ctl.produce(), None);
        ctl.close();
    }

    #[test]
    fn limit_zero_never_allocates() {
        let desc = SequenceDescriptor::new(0).unwrap();
        let alloc = HeapAllocator::new();
        let mut ctl = IteratorController::new(&desc, &alloc);
        assert_eq!(ctl.open(0), Step::Done);
        assert_eq!(ctl.phase(), Phase::Exhausted);
        ctl.close();
        assert_eq!(alloc.stats().allocations, 0);
    }

    #[test]
    fn open_past_end_never_allocates() {
        let desc = SequenceDescriptor::new(5).unwrap();
        let alloc = HeapAllocator::new();
        let mut ctl = IteratorController::new(&desc, &alloc);
        assert_eq!(ctl.open(7), Step::Done);
        assert_eq!(alloc.stats().allocations, 0);
    }

    #[test]
    fn open_mid_sequence() {
        let desc = SequenceDescriptor::new(10).unwrap();
        let alloc = HeapAllocator::new();
        let mut ctl = IteratorController::new(&desc, &alloc);
        assert_eq!(drain(&mut ctl, 7), [14, 16, 18]);
    }

    #[test]
    fn produce_is_idempotent() {
        let desc = SequenceDescriptor::new(3).unwrap();
        let alloc = HeapAllocator::new();
        let mut ctl = IteratorController::new(&desc, &alloc);
        ctl.open(1);
        assert_eq!(ctl.produce(), Some(2));
        assert_eq!(ctl.produce(), Some(2));
        assert_eq!(ctl.position(), Some(1));
    }

    #[test]
    fn advance_reuses_cursor() {
        let desc = SequenceDescriptor::new(100).unwrap();
        let alloc = HeapAllocator::new();
        let mut ctl = IteratorController::new(&desc, &alloc);
        assert_eq!(drain(&mut ctl, 0).len(), 100);
        assert_eq!(alloc.stats().allocations, 1);
    }

    #[test]
    fn full_sink_keeps_element() {
        let desc = SequenceDescriptor::new(10).unwrap();
        let alloc = HeapAllocator::new();
        let mut sink = CountingSink::with_room(2);

        let mut ctl = IteratorController::new(&desc, &alloc);
        ctl.open(0);
        assert_eq!(ctl.show(&mut sink), Show::Written);
        ctl.advance();
        assert_eq!(ctl.show(&mut sink), Show::Written);
        ctl.advance();
        assert_eq!(ctl.show(&mut sink), Show::Full);
        assert!(sink.is_full());
        assert_eq!(ctl.produce(), Some(4));
        assert_eq!(ctl.show(&mut sink), Show::Full);
        assert_eq!(ctl.position(), Some(2));
        ctl.close();

        assert_eq!(sink.seen, [0, 2]);
    }

    #[test]
    fn show_without_cursor_is_idle() {
        let desc = SequenceDescriptor::new(0).unwrap();
        let alloc = HeapAllocator::new();
        let mut sink = CountingSink::with_room(1);
        let mut ctl = IteratorController::new(&desc, &alloc);
        assert_eq!(ctl.show(&mut sink), Show::Idle);
        ctl.open(0);
        assert_eq!(ctl.show(&mut sink), Show::Idle);
    }

    #[test]
    fn close_twice_releases_once() {
        let desc = SequenceDescriptor::new(10).unwrap();
        let alloc = HeapAllocator::new();
        let mut ctl = IteratorController::new(&desc, &alloc);
        ctl.open(0);
        ctl.advance();
        ctl.close();
        ctl.close();
        assert_eq!(ctl.phase(), Phase::Closed);
        let stats = alloc.stats();
        assert_eq!(stats.allocations, 1);
        assert_eq!(stats.releases, 1);
    }

    #[test]
    fn close_after_exhaustion_releases_once() {
        let desc = SequenceDescriptor::new(2).unwrap();
        let alloc = HeapAllocator::new();
        let mut ctl = IteratorController::new(&desc, &alloc);
        drain(&mut ctl, 0);
        assert_eq!(alloc.stats().releases, 1);
        ctl.close();
        ctl.close();
        assert_eq!(alloc.stats().releases, 1);
    }

    #[test]
    fn close_before_open() {
        let desc = SequenceDescriptor::new(10).unwrap();
        let alloc = HeapAllocator::new();
        let mut ctl = IteratorController::new(&desc, &alloc);
        ctl.close();
        assert_eq!(ctl.phase(), Phase::Closed);
        assert_eq!(ctl.open(0), Step::Done);
        assert_eq!(alloc.stats(), crate::stats::CursorStats::default());
    }

    #[test]
    fn allocation_failure_aborts_session() {
        let desc = SequenceDescriptor::new(10).unwrap();
        let alloc = HeapAllocator::new();
        alloc.fail_next(1);

        let mut ctl = IteratorController::new(&desc, &alloc);
        assert_eq!(ctl.open(0), Step::Done);
        assert_eq!(ctl.phase(), Phase::Aborted);
        assert_eq!(ctl.produce(), None);
        assert_eq!(ctl.advance(), Step::Done);
        ctl.close();

        let stats = alloc.stats();
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.allocations, 0);
        assert_eq!(stats.releases, 0);
    }

    #[test]
    fn retry_after_failure_is_a_new_session() {
        let desc = SequenceDescriptor::new(3).unwrap();
        let alloc = HeapAllocator::new();
        alloc.fail_next(1);

        let mut first = IteratorController::new(&desc, &alloc);
        assert!(first.open(0).is_done());
        first.close();

        let mut second = IteratorController::new(&desc, &alloc);
        assert_eq!(drain(&mut second, 0), [0, 2, 4]);
    }

    #[test]
    fn second_open_is_rejected() {
        let desc = SequenceDescriptor::new(10).unwrap();
        let alloc = HeapAllocator::new();
        let mut ctl = IteratorController::new(&desc, &alloc);
        ctl.open(0);
        assert_eq!(ctl.open(3), Step::Done);
        assert_eq!(ctl.position(), Some(0));
        assert_eq!(alloc.stats().allocations, 1);
    }

    #[test]
    fn restart_reproduces_sequence() {
        let desc = SequenceDescriptor::new(4).unwrap();
        let alloc = HeapAllocator::new();
        for _ in 0..3 {
            let mut ctl = IteratorController::new(&desc, &alloc);
            assert_eq!(drain(&mut ctl, 0), [0, 2, 4, 6]);
            ctl.close();
        }
        let stats = alloc.stats();
        assert_eq!(stats.allocations, 3);
        assert_eq!(stats.live(), 0);
    }

    #[test]
    fn drop_releases_active_cursor() {
        let desc = SequenceDescriptor::new(10).unwrap();
        let alloc = HeapAllocator::new();
        {
            let mut ctl = IteratorController::new(&desc, &alloc);
            ctl.open(0);
            ctl.advance();
        }
        let stats = alloc.stats();
        assert_eq!(stats.releases, 1);
        assert_eq!(alloc.outstanding_bytes(), 0);
    }
}
