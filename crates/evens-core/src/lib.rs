//! # evens-core
//!
//! Sequential-read iterator that streams a bounded sequence of even numbers
//! as a virtual file. A [`SeqReader`] drives an [`IteratorController`]
//! session per chunk-fetch round; each session owns exactly one heap cursor
//! obtained from a [`CursorAllocator`].

pub mod constants;
pub mod controller;
pub mod cursor;
pub mod descriptor;
pub mod error;
pub mod reader;
pub mod registry;
pub mod sink;
pub mod stats;

// Re-exports
pub use constants::{exit_codes, DEFAULT_LIMIT, DEFAULT_PAGE_SIZE, PROC_NAME};
pub use controller::{IteratorController, Phase, Show, Step};
pub use cursor::{CursorAllocator, HeapAllocator, SessionCursor};
pub use descriptor::SequenceDescriptor;
pub use error::EvensError;
pub use reader::SeqReader;
pub use registry::ProcRegistry;
pub use sink::{PageBuffer, RenderSink, SinkFull};
pub use stats::CursorStats;

/// Collect the first `limit` even numbers through a single session.
///
/// Convenience wrapper over [`IteratorController`] for callers that want
/// the elements rather than the rendered file.
///
/// # Example
/// ```
/// assert_eq!(evens_core::evens(4).unwrap(), [0, 2, 4, 6]);
/// assert!(evens_core::evens(-1).is_err());
/// ```
pub fn evens(limit: i64) -> Result<Vec<u64>, EvensError> {
    let descriptor = SequenceDescriptor::new(limit)?;
    let allocator = HeapAllocator::new();
    let mut session = IteratorController::new(&descriptor, &allocator);

    let mut out = Vec::new();
    if !session.open(0).is_done() {
        while let Some(value) = session.produce() {
            out.push(value);
            if session.advance().is_done() {
                break;
            }
        }
    }
    session.close();
    Ok(out)
}
