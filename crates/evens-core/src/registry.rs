//! Registry of named virtual files.

use std::collections::BTreeMap;

use tracing::info;

use crate::constants::DEFAULT_PAGE_SIZE;
use crate::cursor::{CursorAllocator, HeapAllocator};
use crate::descriptor::SequenceDescriptor;
use crate::error::EvensError;
use crate::reader::SeqReader;
use crate::sink::PageBuffer;

/// Maps virtual file names to the sequences behind them.
///
/// All readers opened from one registry draw cursors from the same
/// allocator.
///
/// # Example
/// ```
/// use std::io::Read;
/// use evens_core::{ProcRegistry, SequenceDescriptor, PROC_NAME};
///
/// let mut registry = ProcRegistry::new();
/// registry.register(PROC_NAME, SequenceDescriptor::new(2).unwrap()).unwrap();
/// let mut text = String::new();
/// registry.open(PROC_NAME).unwrap().read_to_string(&mut text).unwrap();
/// assert!(text.ends_with("is 2\n"));
/// ```
pub struct ProcRegistry {
    entries: BTreeMap<String, SequenceDescriptor>,
    allocator: HeapAllocator,
    page_size: usize,
}

impl ProcRegistry {
    /// Create an empty registry with an unbudgeted allocator.
    #[must_use]
    pub fn new() -> Self {
        Self::with_allocator(HeapAllocator::new())
    }

    /// Create a registry whose readers allocate from `allocator`.
    #[must_use]
    pub fn with_allocator(allocator: HeapAllocator) -> Self {
        Self {
            entries: BTreeMap::new(),
            allocator,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Set the initial page size of readers opened afterwards.
    #[must_use]
    pub fn page_size(mut self, bytes: usize) -> Self {
        self.page_size = bytes;
        self
    }

    /// Expose `descriptor` under `name`.
    pub fn register(
        &mut self,
        name: &str,
        descriptor: SequenceDescriptor,
    ) -> Result<(), EvensError> {
        if self.entries.contains_key(name) {
            return Err(EvensError::AlreadyRegistered(name.to_string()));
        }
        info!(name, limit = descriptor.limit(), "Registered virtual file");
        self.entries.insert(name.to_string(), descriptor);
        Ok(())
    }

    /// Withdraw `name`; returns whether it was registered.
    pub fn remove(&mut self, name: &str) -> bool {
        let removed = self.entries.remove(name).is_some();
        if removed {
            info!(name, "Removed virtual file");
        }
        removed
    }

    /// Whether `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Open a fresh reader positioned at the start of `name`.
    pub fn open(&self, name: &str) -> Result<SeqReader<'_>, EvensError> {
        let descriptor = self
            .entries
            .get(name)
            .ok_or_else(|| EvensError::NotFound(name.to_string()))?;
        Ok(SeqReader::with_page(
            descriptor,
            &self.allocator,
            PageBuffer::new(self.page_size),
        ))
    }

    /// Snapshot of cursor activity across all readers.
    pub fn stats(&self) -> crate::stats::CursorStats {
        self.allocator.stats()
    }
}

impl Default for ProcRegistry {
    fn default() -> Self {
        Self::new()
    }
}
