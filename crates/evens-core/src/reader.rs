//! Chunked sequential reader over a sequence.
//!
//! `SeqReader` exposes a sequence as a byte stream through [`Read`] and
//! [`Seek`]. Every chunk-fetch round that finds the page empty runs one
//! controller session starting at the next unconsumed record, fills the page
//! until it is full or the sequence ends, then closes the session. Bytes that
//! do not fit the caller's buffer stay in the page for the next `read`.

use std::io::{self, Read, Seek, SeekFrom};

use tracing::{debug, trace};

use crate::constants::DEFAULT_PAGE_SIZE;
use crate::controller::{IteratorController, Phase, Show};
use crate::cursor::CursorAllocator;
use crate::descriptor::SequenceDescriptor;
use crate::sink::{PageBuffer, RenderSink};

/// Outcome of one chunk-fetch round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fill {
    /// The page holds at least one record.
    Data,
    /// The sequence has no records left.
    Eof,
    /// The session could not obtain a cursor.
    Aborted,
}

/// Byte-stream view of a sequence.
pub struct SeqReader<'a> {
    descriptor: &'a SequenceDescriptor,
    allocator: &'a dyn CursorAllocator,
    page: PageBuffer,
    index: u64,
    offset: u64,
    sessions: u64,
}

impl<'a> SeqReader<'a> {
    /// Create a reader positioned at the start of the sequence.
    pub fn new(descriptor: &'a SequenceDescriptor, allocator: &'a dyn CursorAllocator) -> Self {
        Self::with_page(descriptor, allocator, PageBuffer::new(DEFAULT_PAGE_SIZE))
    }

    /// Create a reader that renders into `page`.
    pub fn with_page(
        descriptor: &'a SequenceDescriptor,
        allocator: &'a dyn CursorAllocator,
        page: PageBuffer,
    ) -> Self {
        Self {
            descriptor,
            allocator,
            page,
            index: 0,
            offset: 0,
            sessions: 0,
        }
    }

    /// Byte offset of the next byte `read` returns.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Index of the next record not yet rendered into the page.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Number of controller sessions run so far.
    pub fn sessions(&self) -> u64 {
        self.sessions
    }

    /// Current page capacity in bytes.
    pub fn page_capacity(&self) -> usize {
        self.page.capacity()
    }

    /// Run chunk-fetch rounds until the page has data or no more can come.
    fn fill(&mut self) -> Fill {
        self.page.clear();
        loop {
            let fill = self.run_session();
            if fill == Fill::Eof && self.page.is_full() && self.page.is_empty() {
                // A single record is larger than the page.
                self.page.grow();
                debug!(capacity = self.page.capacity(), "Grew page buffer");
                continue;
            }
            return fill;
        }
    }

    fn run_session(&mut self) -> Fill {
        let mut session = IteratorController::new(self.descriptor, self.allocator);
        self.sessions += 1;
        trace!(index = self.index, session = self.sessions, "Starting session");

        let opened = !session.open(self.index).is_done();
        let aborted = session.phase() == Phase::Aborted;
        if opened {
            while session.show(&mut self.page) == Show::Written {
                self.index += 1;
                if session.advance().is_done() {
                    break;
                }
            }
        }
        session.close();

        if aborted {
            Fill::Aborted
        } else if self.page.is_empty() {
            Fill::Eof
        } else {
            Fill::Data
        }
    }

    /// Restart from record 0 and skip `target` bytes.
    fn traverse(&mut self, target: u64) -> io::Result<()> {
        self.index = 0;
        self.offset = 0;
        self.page.clear();

        while self.offset < target {
            if self.page.is_drained() {
                match self.fill() {
                    Fill::Data => {}
                    Fill::Eof => break,
                    Fill::Aborted => {
                        self.index = 0;
                        self.offset = 0;
                        self.page.clear();
                        return Err(io::Error::new(
                            io::ErrorKind::OutOfMemory,
                            "cursor allocation failed while seeking",
                        ));
                    }
                }
            }
            let skipped = self.page.discard(target - self.offset);
            self.offset += skipped as u64;
        }

        // Past the end: reads from here return nothing.
        self.offset = target;
        Ok(())
    }
}

impl Read for SeqReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.page.is_drained() && self.fill() != Fill::Data {
            return Ok(0);
        }
        let n = self.page.copy_to(buf);
        self.offset += n as u64;
        Ok(n)
    }
}

impl Seek for SeqReader<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(n) => Some(n),
            SeekFrom::Current(delta) => self.offset.checked_add_signed(delta),
            SeekFrom::End(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "seeking from the end is not supported",
                ));
            }
        };
        let target = target.ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek to a negative offset")
        })?;

        if target != self.offset {
            debug!(from = self.offset, to = target, "Seeking");
            self.traverse(target)?;
        }
        Ok(self.offset)
    }
}
