// file: src/logging/mod.rs
// version: 2.0.0
// guid: i9j0k1l2-a3b4-5678-9012-345678abcdef

//! Logging setup for the installer configuration engine

pub mod logger;

pub use logger::{init_logger, log_file_name, with_operation_span, LogOptions};
