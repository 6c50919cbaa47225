//! Constants for the evens virtual file and its reader.

/// Default exclusive bound on the number of records.
pub const DEFAULT_LIMIT: i64 = 10;

/// Name under which the sequence is registered.
pub const PROC_NAME: &str = "evens";

/// Initial capacity (in bytes) of a reader's page buffer.
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// Text preceding each rendered value.
pub const RECORD_PREFIX: &str = "The current value of the even number is ";

/// Exit codes for the command-line front end.
pub mod exit_codes {
    /// Generic error.
    pub const ERROR_GENERIC: i32 = 1;
    /// Invalid configuration.
    pub const ERROR_CONFIG: i32 = 4;
}
