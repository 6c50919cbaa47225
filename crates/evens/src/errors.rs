//! Error handling and exit codes.

use evens_core::exit_codes;
use evens_core::EvensError;

/// Map an evens error to its exit code.
pub fn handle_error(err: &EvensError) -> i32 {
    if err.is_config() {
        exit_codes::ERROR_CONFIG
    } else {
        exit_codes::ERROR_GENERIC
    }
}

/// Exit status for a top-level application error.
pub fn exit_status(err: &anyhow::Error) -> u8 {
    let code = err
        .downcast_ref::<EvensError>()
        .map_or(exit_codes::ERROR_GENERIC, handle_error);
    u8::try_from(code).unwrap_or(1)
}
