//! Application entry point: register the evens file and stream it out.

use std::io::{self, Read, Seek, SeekFrom, Write};

use anyhow::{Context, Result};
use tracing::info;

use evens_core::{CursorStats, HeapAllocator, ProcRegistry, SequenceDescriptor, PROC_NAME};

use crate::config::AppConfig;

/// Counters from one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Bytes written to the output.
    pub bytes: u64,
    /// Read calls made against the virtual file.
    pub reads: u64,
    /// Controller sessions the reader ran.
    pub sessions: u64,
    /// Cursor allocator counters.
    pub cursors: CursorStats,
}

impl RunSummary {
    /// One-line human-readable rendering.
    #[must_use]
    pub fn line(&self) -> String {
        format!(
            "{} bytes in {} reads, {} sessions, cursors: {} allocated, {} released, {} failed",
            self.bytes,
            self.reads,
            self.sessions,
            self.cursors.allocations,
            self.cursors.releases,
            self.cursors.failures,
        )
    }
}

/// Run the application against stdout.
pub fn run(config: &AppConfig) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let summary = stream(config, &mut out)?;
    out.flush().context("flushing output")?;

    info!(
        bytes = summary.bytes,
        sessions = summary.sessions,
        "Read complete"
    );
    if !config.quiet {
        eprintln!("{}", summary.line());
    }
    Ok(())
}

/// Register the evens file, read it in `read_size` chunks into `out`, then remove it.
pub fn stream<W: Write>(config: &AppConfig, out: &mut W) -> Result<RunSummary> {
    let descriptor = SequenceDescriptor::new(config.limit)?;

    let allocator = HeapAllocator::new();
    if config.fail_allocations > 0 {
        allocator.fail_next(config.fail_allocations);
    }

    let mut registry = ProcRegistry::with_allocator(allocator).page_size(config.page_len());
    registry.register(PROC_NAME, descriptor)?;

    let (bytes, reads, sessions) = {
        let mut reader = registry.open(PROC_NAME)?;
        if config.offset > 0 {
            reader
                .seek(SeekFrom::Start(config.offset))
                .with_context(|| format!("seeking to offset {}", config.offset))?;
        }

        let mut buf = vec![0u8; config.read_len()];
        let mut bytes = 0u64;
        let mut reads = 0u64;
        loop {
            let n = reader.read(&mut buf).context("reading virtual file")?;
            reads += 1;
            if n == 0 {
                break;
            }
            out.write_all(&buf[..n]).context("writing output")?;
            bytes += n as u64;
        }
        (bytes, reads, reader.sessions())
    };

    let cursors = registry.stats();
    registry.remove(PROC_NAME);

    Ok(RunSummary {
        bytes,
        reads,
        sessions,
        cursors,
    })
}
