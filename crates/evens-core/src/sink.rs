//! Rendering sinks: where produced elements are turned into bytes.

use std::io::Write;

use crate::constants::{DEFAULT_PAGE_SIZE, RECORD_PREFIX};

/// Renders one element into bytes appended to `out`.
pub type RenderFn = fn(&mut Vec<u8>, u64);

/// Render an element as one line of the evens file.
pub fn render_even_record(out: &mut Vec<u8>, value: u64) {
    // Writing into a Vec<u8> cannot fail.
    let _ = writeln!(out, "{RECORD_PREFIX}{value}");
}

/// The sink had no room for a whole record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("render sink is full")]
pub struct SinkFull;

/// Consumer of produced elements with a backpressure signal.
pub trait RenderSink {
    /// Append the rendered form of `element`, or report that it does not fit.
    ///
    /// A rejected record leaves the sink unchanged.
    fn render(&mut self, element: u64) -> Result<(), SinkFull>;

    /// Whether the last render was rejected for lack of room.
    fn is_full(&self) -> bool;
}

/// Capacity-bounded page of rendered records.
///
/// Holds bytes that have been rendered but not yet copied out to a caller,
/// starting at `from`.
#[derive(Debug)]
pub struct PageBuffer {
    buf: Vec<u8>,
    from: usize,
    capacity: usize,
    overflowed: bool,
    render: RenderFn,
}

impl PageBuffer {
    /// Create an empty page rendering evens records.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self::with_renderer(capacity, render_even_record)
    }

    /// Create an empty page with a custom renderer.
    #[must_use]
    pub fn with_renderer(capacity: usize, render: RenderFn) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            from: 0,
            capacity: capacity.max(1),
            overflowed: false,
            render,
        }
    }

    /// Maximum number of bytes the page accepts.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether nothing has been rendered since the last clear.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Whether every rendered byte has been handed out.
    pub fn is_drained(&self) -> bool {
        self.from >= self.buf.len()
    }

    /// Bytes rendered but not yet handed out.
    pub fn pending(&self) -> &[u8] {
        &self.buf[self.from..]
    }

    /// Copy pending bytes into `out`; returns how many were copied.
    pub fn copy_to(&mut self, out: &mut [u8]) -> usize {
        let pending = self.pending();
        let n = pending.len().min(out.len());
        out[..n].copy_from_slice(&pending[..n]);
        self.from += n;
        n
    }

    /// Drop up to `count` pending bytes; returns how many were dropped.
    pub fn discard(&mut self, count: u64) -> usize {
        let n = usize::try_from(count)
            .unwrap_or(usize::MAX)
            .min(self.buf.len() - self.from);
        self.from += n;
        n
    }

    /// Forget all content and the overflow flag.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.from = 0;
        self.overflowed = false;
    }

    /// Double the capacity and clear the page.
    pub fn grow(&mut self) {
        self.capacity = self.capacity.saturating_mul(2);
        self.buf.reserve(self.capacity.saturating_sub(self.buf.capacity()));
        self.clear();
    }
}

impl Default for PageBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl RenderSink for PageBuffer {
    fn render(&mut self, element: u64) -> Result<(), SinkFull> {
        let start = self.buf.len();
        (self.render)(&mut self.buf, element);
        if self.buf.len() > self.capacity {
            self.buf.truncate(start);
            self.overflowed = true;
            return Err(SinkFull);
        }
        Ok(())
    }

    fn is_full(&self) -> bool {
        self.overflowed
    }
}
