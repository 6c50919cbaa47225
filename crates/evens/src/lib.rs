//! Evens library: application logic for the evens virtual file reader.

pub mod app;
pub mod config;
pub mod errors;
