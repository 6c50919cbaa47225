//! Integration test host for the evens workspace.
//!
//! Cross-crate tests live under `tests/`.
