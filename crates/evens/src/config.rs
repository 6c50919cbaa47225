//! Application configuration from CLI flags and environment.

use clap::Parser;

use evens_core::{DEFAULT_LIMIT, DEFAULT_PAGE_SIZE};

/// Evens: read a bounded sequence of even numbers through a virtual file.
#[derive(Parser, Debug)]
#[command(name = "evens", version, allow_negative_numbers = true)]
pub struct AppConfig {
    /// Number of records in the file (must be >= 0).
    #[arg(short, long, default_value_t = DEFAULT_LIMIT, env = "EVENS_LIMIT")]
    pub limit: i64,

    /// Bytes requested per read call.
    #[arg(long, default_value_t = 4096, value_parser = clap::value_parser!(u64).range(1..))]
    pub read_size: u64,

    /// Initial page buffer size in bytes.
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE as u64, value_parser = clap::value_parser!(u64).range(1..))]
    pub page_size: u64,

    /// Byte offset to seek to before reading.
    #[arg(long, default_value = "0")]
    pub offset: u64,

    /// Make the next N cursor allocations fail.
    #[arg(long, default_value = "0")]
    pub fail_allocations: u64,

    /// Verbose output (debug logging).
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet mode (no summary line).
    #[arg(short, long)]
    pub quiet: bool,
}

impl AppConfig {
    /// Parse CLI arguments.
    #[must_use]
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Read size as a buffer length.
    #[must_use]
    pub fn read_len(&self) -> usize {
        usize::try_from(self.read_size).unwrap_or(usize::MAX)
    }

    /// Page size as a buffer length.
    #[must_use]
    pub fn page_len(&self) -> usize {
        usize::try_from(self.page_size).unwrap_or(usize::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> AppConfig {
        AppConfig::try_parse_from(std::iter::once("evens").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let config = parse(&[]);
        assert_eq!(config.limit, DEFAULT_LIMIT);
        assert_eq!(config.read_len(), 4096);
        assert_eq!(config.page_len(), DEFAULT_PAGE_SIZE);
        assert_eq!(config.offset, 0);
        assert!(!config.quiet);
    }

    #[test]
    fn negative_limit_parses() {
        assert_eq!(parse(&["--limit", "-1"]).limit, -1);
    }

    #[test]
    fn about_comes_from_doc_comment() {
        use clap::CommandFactory;
        let about = AppConfig::command()
            .get_about()
            .map(ToString::to_string)
            .unwrap_or_default();
        assert!(about.contains("even numbers"), "about = {about}");
    }

    #[test]
    fn zero_read_size_rejected() {
        assert!(AppConfig::try_parse_from(["evens", "--read-size", "0"]).is_err());
    }

    #[test]
    fn flags() {
        let config = parse(&["-l", "3", "--offset", "12", "--fail-allocations", "2", "-q"]);
        assert_eq!(config.limit, 3);
        assert_eq!(config.offset, 12);
        assert_eq!(config.fail_allocations, 2);
        assert!(config.quiet);
    }
}
